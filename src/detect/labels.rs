//! 类别标签表
//!
//! 标签由模型提供：Hugging Face 风格的 `config.json`（`id2label` 字段），
//! 或者每行一个名称的纯文本文件。

use serde::Deserialize;
use std::collections::{BTreeMap, HashMap};
use std::path::Path;

use crate::error::{Error, Result};

#[derive(Debug, Deserialize)]
struct ModelConfig {
    id2label: HashMap<String, String>,
}

/// 类别ID到名称的映射
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LabelTable {
    names: BTreeMap<usize, String>,
}

impl LabelTable {
    /// 按顺序给出的名称，第 i 个名称对应类别 i
    pub fn from_names<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            names: names.into_iter().map(Into::into).enumerate().collect(),
        }
    }

    /// 读取标签文件；`.json` 按模型配置解析，其余按逐行文本解析
    pub fn load(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path).map_err(|e| Error::Labels {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;
        let is_json = path
            .extension()
            .is_some_and(|ext| ext.eq_ignore_ascii_case("json"));
        let table = if is_json {
            Self::from_config_json(&raw).map_err(|e| Error::Labels {
                path: path.to_path_buf(),
                reason: e.to_string(),
            })?
        } else {
            Self::from_lines(&raw)
        };
        if table.is_empty() {
            return Err(Error::Labels {
                path: path.to_path_buf(),
                reason: "no labels found".to_string(),
            });
        }
        Ok(table)
    }

    /// 解析模型配置中的 `id2label`
    pub fn from_config_json(raw: &str) -> Result<Self> {
        let config: ModelConfig = serde_json::from_str(raw)?;
        let mut names = BTreeMap::new();
        for (key, name) in config.id2label {
            let id = key.trim().parse::<usize>().map_err(|_| Error::Labels {
                path: "config.json".into(),
                reason: format!("class id {key:?} is not an integer"),
            })?;
            names.insert(id, name);
        }
        Ok(Self { names })
    }

    /// 每行一个名称，忽略空行
    pub fn from_lines(raw: &str) -> Self {
        Self::from_names(raw.lines().map(str::trim).filter(|line| !line.is_empty()))
    }

    pub fn name(&self, class_id: usize) -> Option<&str> {
        self.names.get(&class_id).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }
}
