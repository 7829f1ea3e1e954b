use std::collections::BTreeMap;
use std::path::Path;

/// 文件分段缺省的字段名
pub const DEFAULT_FILE_KEY: &str = "file";

/// 文件分段缺省的 MIME 类型
pub const DEFAULT_MIME_TYPE: &str = "application/octet-stream";

/// multipart/form-data 上传的表单描述。
///
/// 文件内容作为 `file_key` 字段发送，`params` 中的每一项作为额外的文本字段。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MultipartForm {
    /// 服务端用来解析文件的字段名
    pub file_key: String,
    /// 为 `None` 时使用源文件名
    pub file_name: Option<String>,
    pub mime_type: String,
    pub params: BTreeMap<String, String>,
}

impl Default for MultipartForm {
    fn default() -> Self {
        Self {
            file_key: DEFAULT_FILE_KEY.to_string(),
            file_name: None,
            mime_type: DEFAULT_MIME_TYPE.to_string(),
            params: BTreeMap::new(),
        }
    }
}

impl MultipartForm {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn file_key(mut self, file_key: impl Into<String>) -> Self {
        self.file_key = file_key.into();
        self
    }

    pub fn file_name(mut self, file_name: impl Into<String>) -> Self {
        self.file_name = Some(file_name.into());
        self
    }

    pub fn mime_type(mut self, mime_type: impl Into<String>) -> Self {
        self.mime_type = mime_type.into();
        self
    }

    /// 追加一个文本字段，同名字段后写覆盖先写
    pub fn param(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.params.insert(key.into(), value.into());
        self
    }

    /// 没有指定文件名时补上源文件名
    pub(crate) fn with_source_name(mut self, source: &Path) -> Self {
        if self.file_name.is_none() {
            self.file_name = source
                .file_name()
                .map(|name| name.to_string_lossy().into_owned());
        }
        self
    }
}
