use std::path::{Path, PathBuf};

use bytes::{BufMut, Bytes, BytesMut};
use mime::Mime;

use super::ClientError;

/// The content of a file attachment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FileSource {
    /// A file on disk, read when the request is sent.
    Path(PathBuf),
    /// In-memory content.
    Bytes(Bytes),
}

impl FileSource {
    pub(crate) fn file_name(&self) -> Option<String> {
        match self {
            Self::Path(path) => path
                .file_name()
                .map(|name| name.to_string_lossy().into_owned()),
            Self::Bytes(_) => None,
        }
    }

    pub(crate) async fn read(&self) -> Result<Bytes, ClientError> {
        match self {
            Self::Path(path) => Ok(Bytes::from(tokio::fs::read(path).await?)),
            Self::Bytes(bytes) => Ok(bytes.clone()),
        }
    }
}

impl From<PathBuf> for FileSource {
    fn from(value: PathBuf) -> Self {
        Self::Path(value)
    }
}

impl From<&Path> for FileSource {
    fn from(value: &Path) -> Self {
        Self::Path(value.to_path_buf())
    }
}

impl From<&str> for FileSource {
    fn from(value: &str) -> Self {
        Self::Path(PathBuf::from(value))
    }
}

impl From<Bytes> for FileSource {
    fn from(value: Bytes) -> Self {
        Self::Bytes(value)
    }
}

impl From<Vec<u8>> for FileSource {
    fn from(value: Vec<u8>) -> Self {
        Self::Bytes(Bytes::from(value))
    }
}

impl From<&'static [u8]> for FileSource {
    fn from(value: &'static [u8]) -> Self {
        Self::Bytes(Bytes::from_static(value))
    }
}

/// Guesses the media type of a file from its extension.
pub(crate) fn guess_mime(filename: &str) -> Option<Mime> {
    let extension = Path::new(filename).extension()?.to_str()?.to_ascii_lowercase();
    let mime = match extension.as_str() {
        "txt" => mime::TEXT_PLAIN,
        "csv" => mime::TEXT_CSV,
        "html" | "htm" => mime::TEXT_HTML,
        "css" => mime::TEXT_CSS,
        "xml" => mime::TEXT_XML,
        "js" => mime::TEXT_JAVASCRIPT,
        "json" => mime::APPLICATION_JSON,
        "pdf" => mime::APPLICATION_PDF,
        "png" => mime::IMAGE_PNG,
        "jpg" | "jpeg" => mime::IMAGE_JPEG,
        "gif" => mime::IMAGE_GIF,
        "bmp" => mime::IMAGE_BMP,
        "svg" => mime::IMAGE_SVG,
        "woff" => mime::FONT_WOFF,
        "woff2" => mime::FONT_WOFF2,
        "bin" => mime::APPLICATION_OCTET_STREAM,
        _ => return None,
    };
    Some(mime)
}

/// A text part of a multipart body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TextPart {
    /// Form field name.
    pub name: String,
    /// Field value.
    pub value: String,
}

/// A file part of a multipart body, its content already loaded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FilePart {
    /// Form field name.
    pub field: String,
    /// File name sent in the part's `content-disposition`.
    pub filename: String,
    /// Media type of the part.
    pub mime: Option<Mime>,
    /// File content.
    pub content: Bytes,
}

/// The parts of a `multipart/form-data` body, in the order they were added.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Multipart {
    /// Text fields.
    pub fields: Vec<TextPart>,
    /// File attachments.
    pub files: Vec<FilePart>,
}

impl Multipart {
    /// Encodes the body with a fresh boundary.
    ///
    /// Returns the `content-type` header value, boundary included, and the encoded body.
    pub fn encode(&self) -> (String, Bytes) {
        let boundary = format!("exemplar-{}", uuid::Uuid::new_v4().simple());
        let body = self.encode_with_boundary(&boundary);
        (format!("multipart/form-data; boundary={boundary}"), body)
    }

    fn encode_with_boundary(&self, boundary: &str) -> Bytes {
        let mut buffer = BytesMut::new();
        for TextPart { name, value } in &self.fields {
            buffer.put_slice(format!("--{boundary}\r\n").as_bytes());
            buffer.put_slice(
                format!("Content-Disposition: form-data; name=\"{}\"\r\n\r\n", escape(name))
                    .as_bytes(),
            );
            buffer.put_slice(value.as_bytes());
            buffer.put_slice(b"\r\n");
        }
        for file in &self.files {
            buffer.put_slice(format!("--{boundary}\r\n").as_bytes());
            buffer.put_slice(
                format!(
                    "Content-Disposition: form-data; name=\"{}\"; filename=\"{}\"\r\n",
                    escape(&file.field),
                    escape(&file.filename)
                )
                .as_bytes(),
            );
            let mime = file.mime.as_ref().unwrap_or(&mime::APPLICATION_OCTET_STREAM);
            buffer.put_slice(format!("Content-Type: {mime}\r\n\r\n").as_bytes());
            buffer.put_slice(&file.content);
            buffer.put_slice(b"\r\n");
        }
        buffer.put_slice(format!("--{boundary}--\r\n").as_bytes());
        buffer.freeze()
    }
}

fn escape(value: &str) -> String {
    value
        .replace('\\', "\\\\")
        .replace('"', "\\\"")
        .replace(['\r', '\n'], " ")
}
