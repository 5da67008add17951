use std::fs::{self, File};
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use serde_json::{json, Value};
use thiserror::Error;
use walkdir::WalkDir;
use zip::write::FileOptions;
use zip::{CompressionMethod, ZipWriter};

#[derive(Debug, Error)]
pub enum PackageError {
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("Invalid manifest: {0}")]
    Manifest(#[from] serde_json::Error),

    #[error("Manifest missing at {0}")]
    MissingManifest(PathBuf),

    #[error("Walking {0}")]
    Walk(#[from] walkdir::Error),

    #[error("Zip error: {0}")]
    Zip(#[from] zip::result::ZipError),
}

pub type Result<T> = std::result::Result<T, PackageError>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BrowserTarget {
    Chrome,
    Firefox,
}

impl BrowserTarget {
    pub const ALL: [BrowserTarget; 2] = [BrowserTarget::Chrome, BrowserTarget::Firefox];

    pub fn name(self) -> &'static str {
        match self {
            BrowserTarget::Chrome => "chrome",
            BrowserTarget::Firefox => "firefox",
        }
    }
}

#[derive(Debug, Clone)]
pub struct PackageConfig {
    /// Compiled scripts, copied to `dist/` inside each build
    pub dist_dir: PathBuf,
    /// Static files including `manifest.json`, copied to the build root
    pub public_dir: PathBuf,
    pub build_dir: PathBuf,
    pub release_dir: PathBuf,
    pub version: String,
}

impl Default for PackageConfig {
    fn default() -> Self {
        Self {
            dist_dir: PathBuf::from("dist"),
            public_dir: PathBuf::from("public"),
            build_dir: PathBuf::from("build"),
            release_dir: PathBuf::from("release"),
            version: env!("CARGO_PKG_VERSION").to_string(),
        }
    }
}

/// Sets the version and applies the target's background declaration.
///
/// Firefox gets `background.scripts` in place of `service_worker`.
pub fn rewrite_manifest(manifest: &mut Value, version: &str, target: BrowserTarget) {
    manifest["version"] = Value::String(version.to_string());

    if target == BrowserTarget::Firefox {
        let worker = manifest
            .get("background")
            .and_then(|background| background.get("service_worker"))
            .cloned();
        if let Some(worker) = worker {
            manifest["background"] = json!({ "scripts": [worker] });
        }
    }
}

/// Builds release archives for both browsers and returns their paths.
///
/// Each target gets `build/<target>/` (compiled assets under `dist/`, the
/// public directory overlaid at the root, manifest patched), zipped into
/// `release/<target>-v<version>.zip`. Earlier builds are removed first.
pub fn package_all(config: &PackageConfig) -> Result<Vec<PathBuf>> {
    log::info!("Building extension version {}", config.version);

    recreate_dir(&config.build_dir)?;
    recreate_dir(&config.release_dir)?;

    let mut archives = Vec::new();
    for target in BrowserTarget::ALL {
        archives.push(package_target(config, target)?);
    }
    log::info!("Done, archives in {}", config.release_dir.display());
    Ok(archives)
}

pub fn package_target(config: &PackageConfig, target: BrowserTarget) -> Result<PathBuf> {
    let out_dir = config.build_dir.join(target.name());
    recreate_dir(&out_dir)?;

    copy_dir(&config.dist_dir, &out_dir.join("dist"))?;
    copy_dir(&config.public_dir, &out_dir)?;

    let manifest_path = out_dir.join("manifest.json");
    if !manifest_path.is_file() {
        return Err(PackageError::MissingManifest(manifest_path));
    }
    let mut manifest: Value = serde_json::from_str(&fs::read_to_string(&manifest_path)?)?;
    rewrite_manifest(&mut manifest, &config.version, target);
    fs::write(&manifest_path, serde_json::to_string_pretty(&manifest)?)?;

    let archive = config
        .release_dir
        .join(format!("{}-v{}.zip", target.name(), config.version));
    zip_dir(&out_dir, &archive)?;
    log::info!("Built {}", archive.display());
    Ok(archive)
}

fn recreate_dir(dir: &Path) -> Result<()> {
    if dir.exists() {
        fs::remove_dir_all(dir)?;
    }
    fs::create_dir_all(dir)?;
    Ok(())
}

fn copy_dir(src: &Path, dst: &Path) -> Result<()> {
    for entry in WalkDir::new(src) {
        let entry = entry?;
        let relative = entry.path().strip_prefix(src).unwrap_or(entry.path());
        let target = dst.join(relative);

        if entry.file_type().is_dir() {
            fs::create_dir_all(&target)?;
        } else {
            if let Some(parent) = target.parent() {
                fs::create_dir_all(parent)?;
            }
            fs::copy(entry.path(), &target)?;
        }
    }
    Ok(())
}

/// Zips the contents of `src` (not `src` itself) into `out`.
fn zip_dir(src: &Path, out: &Path) -> Result<()> {
    if let Some(parent) = out.parent() {
        fs::create_dir_all(parent)?;
    }

    let mut zip = ZipWriter::new(File::create(out)?);
    let options = FileOptions::default()
        .compression_method(CompressionMethod::Deflated)
        .compression_level(Some(9));

    for entry in WalkDir::new(src).sort_by_file_name() {
        let entry = entry?;
        let relative = match entry.path().strip_prefix(src) {
            Ok(relative) if !relative.as_os_str().is_empty() => relative,
            _ => continue,
        };
        let name = relative
            .components()
            .map(|c| c.as_os_str().to_string_lossy())
            .collect::<Vec<_>>()
            .join("/");

        if entry.file_type().is_dir() {
            zip.add_directory(name, options)?;
        } else {
            zip.start_file(name, options)?;
            zip.write_all(&fs::read(entry.path())?)?;
        }
    }

    zip.finish()?;
    Ok(())
}
