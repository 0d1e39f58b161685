// 该文件是 Shanan Bridge（山南桥）项目的一部分。
// src/input/read_image_file.rs - 图像文件输入
//
// 本文件根据 Apache 许可证第 2.0 版（以下简称“许可证”）授权使用；
// 除非遵守该许可证条款，否则您不得使用本文件。
// 您可通过以下网址获取许可证副本：
// http://www.apache.org/licenses/LICENSE-2.0
// 除非适用法律要求或书面同意，根据本许可协议分发的软件均按“原样”提供，
// 不附带任何形式的明示或暗示的保证或条件。
// 有关许可权限与限制的具体条款，请参阅本许可协议。
//
// Copyright (C) 2026 Johann Li <me@qinka.pro>, Wareless Group

use std::path::{Path, PathBuf};

use image::ImageReader;
use thiserror::Error;
use tracing::{debug, error};
use url::Url;

use crate::{
  FromUrl, FromUrlWithScheme,
  frame::{Header, WireImage},
};

const IMAGE_EXTENSIONS: [&str; 6] = ["png", "jpg", "jpeg", "bmp", "gif", "webp"];

#[derive(Error, Debug)]
pub enum ImageFileInputError {
  #[error("URI schema mismatch: expected '{expected}', found '{found}'")]
  SchemaMismatch {
    expected: &'static str,
    found: String,
  },
  #[error("I/O error: {0}")]
  IoError(#[from] std::io::Error),
  #[error("Image loading error: {0}")]
  ImageLoadError(#[from] image::ImageError),
}

/// 读取图像文件为 rgb8 线上图像，文件名作为 frame_id
pub fn read_wire_image(path: &Path) -> Result<WireImage, ImageFileInputError> {
  let image = ImageReader::open(path)?.decode()?.to_rgb8();
  let frame_id = path
    .file_name()
    .map(|name| name.to_string_lossy().into_owned())
    .unwrap_or_default();
  debug!(
    "读取图像 {}: {}x{}",
    path.display(),
    image.width(),
    image.height()
  );
  Ok(WireImage::from_rgb_image(&image, Header::now(frame_id)))
}

fn check_scheme(url: &Url, expected: &'static str) -> Result<(), ImageFileInputError> {
  if url.scheme() != expected {
    error!(
      "URI scheme mismatch: expected '{}', found '{}'",
      expected,
      url.scheme()
    );
    return Err(ImageFileInputError::SchemaMismatch {
      expected,
      found: url.scheme().to_string(),
    });
  }
  Ok(())
}

/// 单张图像输入，只产生一帧
pub struct ImageFileInput {
  image: Option<WireImage>,
}

impl FromUrlWithScheme for ImageFileInput {
  const SCHEME: &'static str = "image";
}

impl FromUrl for ImageFileInput {
  type Error = ImageFileInputError;

  fn from_url(url: &Url) -> Result<Self, Self::Error> {
    check_scheme(url, Self::SCHEME)?;
    let image = read_wire_image(Path::new(url.path()))?;
    Ok(ImageFileInput { image: Some(image) })
  }
}

impl Iterator for ImageFileInput {
  type Item = WireImage;

  fn next(&mut self) -> Option<Self::Item> {
    self.image.take()
  }
}

/// 目录输入，按文件名顺序逐个读取图像
pub struct FolderInput {
  files: std::vec::IntoIter<PathBuf>,
}

impl FromUrlWithScheme for FolderInput {
  const SCHEME: &'static str = "folder";
}

impl FromUrl for FolderInput {
  type Error = ImageFileInputError;

  fn from_url(url: &Url) -> Result<Self, Self::Error> {
    check_scheme(url, Self::SCHEME)?;
    Self::open(Path::new(url.path()))
  }
}

impl FolderInput {
  pub fn open(directory: &Path) -> Result<Self, ImageFileInputError> {
    let mut files = Vec::new();
    for entry in std::fs::read_dir(directory)? {
      let path = entry?.path();
      let is_image = path
        .extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| IMAGE_EXTENSIONS.contains(&ext.to_ascii_lowercase().as_str()))
        .unwrap_or(false);
      if path.is_file() && is_image {
        files.push(path);
      }
    }
    files.sort();
    debug!("目录 {} 中共有 {} 张图像", directory.display(), files.len());

    Ok(FolderInput {
      files: files.into_iter(),
    })
  }
}

impl Iterator for FolderInput {
  type Item = WireImage;

  fn next(&mut self) -> Option<Self::Item> {
    for path in self.files.by_ref() {
      match read_wire_image(&path) {
        Ok(image) => return Some(image),
        Err(e) => error!("读取图像 {} 失败, 跳过: {}", path.display(), e),
      }
    }
    None
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use image::{Rgb, RgbImage};

  fn scratch_dir(name: &str) -> PathBuf {
    let dir = std::env::temp_dir().join(format!(
      "shanan-bridge-{}-{}",
      name,
      std::process::id()
    ));
    let _ = std::fs::remove_dir_all(&dir);
    std::fs::create_dir_all(&dir).unwrap();
    dir
  }

  #[test]
  fn folder_input_reads_images_in_name_order() {
    let dir = scratch_dir("folder-input");
    RgbImage::from_pixel(3, 2, Rgb([1, 2, 3]))
      .save(dir.join("b.png"))
      .unwrap();
    RgbImage::from_pixel(4, 1, Rgb([9, 8, 7]))
      .save(dir.join("a.png"))
      .unwrap();
    std::fs::write(dir.join("notes.txt"), "not an image").unwrap();

    let url = Url::parse(&format!("folder://{}", dir.display())).unwrap();
    let frames: Vec<WireImage> = FolderInput::from_url(&url).unwrap().collect();

    assert_eq!(frames.len(), 2);
    assert_eq!(frames[0].header.frame_id, "a.png");
    assert_eq!(frames[0].geometry(), (4, 1));
    assert_eq!(frames[0].encoding, "rgb8");
    assert_eq!(&frames[0].data[..3], &[9, 8, 7]);
    assert_eq!(frames[1].geometry(), (3, 2));

    std::fs::remove_dir_all(&dir).unwrap();
  }

  #[test]
  fn image_input_yields_one_frame() {
    let dir = scratch_dir("image-input");
    let path = dir.join("frame.png");
    RgbImage::from_pixel(2, 2, Rgb([5, 5, 5])).save(&path).unwrap();

    let url = Url::parse(&format!("image://{}", path.display())).unwrap();
    let mut input = ImageFileInput::from_url(&url).unwrap();
    assert!(input.next().is_some());
    assert!(input.next().is_none());

    std::fs::remove_dir_all(&dir).unwrap();
  }

  #[test]
  fn wrong_scheme_is_rejected() {
    let url = Url::parse("folder:///tmp/frame.png").unwrap();
    assert!(matches!(
      ImageFileInput::from_url(&url),
      Err(ImageFileInputError::SchemaMismatch { .. })
    ));
  }
}
