use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Error, Debug)]
pub enum Error {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Zip error: {0}")]
    Zip(#[from] zip::result::ZipError),

    #[cfg(feature = "sevenz")]
    #[error("7z error: {0}")]
    SevenZip(#[from] sevenz_rust::Error),

    #[error("Unsupported archive format: {0}\n\n\
             Hint: Only .zip and .7z archives can be imported.")]
    UnsupportedFormat(String),

    #[error("Unable to extract 7z archive: no extraction tool available\n\n\
             Hint: Install 7-Zip (https://www.7-zip.org/) and make sure `7z` is on your PATH,\n\
             or rebuild unrealmgr with the `sevenz` feature enabled.")]
    MissingExtractor,

    #[error("Extraction failed: {0}")]
    ExtractorFailed(String),

    #[error("Category '{category}' still holds {count} asset(s) and cannot be removed")]
    CategoryInUse { category: String, count: usize },

    #[error("Category '{0}' is built in and cannot be removed")]
    ProtectedCategory(String),

    #[error("No .uproject file found in {0}\n\n\
             Hint: Point at the folder that contains your project's .uproject file.\n\n\
             Example structure:\n\
             MyProject/\n\
             ├── MyProject.uproject  ← This file is required\n\
             ├── Config/\n\
             └── Content/")]
    NoUProjectFile(String),

    #[error("{0}")]
    Other(String),
}
