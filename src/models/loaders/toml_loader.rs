use crate::models::scope::{RawRegion, RawSubRegion, ScopeEntry};
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;
use tokio::fs;

/// 范围文件结构
///
/// ```toml
/// [[regions]]
/// value = "13"
/// name = "Malda"
///
/// [[regions.sub_regions]]
/// value = "44"
/// name = "Habibpur"
/// parts = [{ value = "1", name = "1" }]
/// ```
#[derive(Debug, Default, Serialize, Deserialize)]
struct ScopeFile {
    #[serde(default)]
    regions: Vec<RegionRecord>,
}

#[derive(Debug, Serialize, Deserialize)]
struct RegionRecord {
    value: String,
    name: String,
    #[serde(default)]
    sub_regions: Vec<SubRegionRecord>,
}

#[derive(Debug, Serialize, Deserialize)]
struct SubRegionRecord {
    value: String,
    name: String,
    #[serde(default)]
    parts: Vec<ScopeEntry>,
}

/// 从 TOML 范围文件加载原始枚举结果
pub async fn load_scope_file(path: &Path) -> Result<Vec<RawRegion>> {
    let content = fs::read_to_string(path)
        .await
        .with_context(|| format!("无法读取范围文件: {}", path.display()))?;

    parse_scope(&content).with_context(|| format!("无法解析范围文件: {}", path.display()))
}

/// 将枚举结果写入 TOML 范围文件，供下次运行直接使用
pub async fn save_scope_file(path: &Path, regions: &[RawRegion]) -> Result<()> {
    let content = render_scope(regions)?;

    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)
            .await
            .with_context(|| format!("无法创建目录: {}", parent.display()))?;
    }

    fs::write(path, content)
        .await
        .with_context(|| format!("无法写入范围文件: {}", path.display()))?;

    tracing::info!("💾 范围已缓存至: {}", path.display());
    Ok(())
}

fn parse_scope(content: &str) -> Result<Vec<RawRegion>> {
    let file: ScopeFile = toml::from_str(content)?;

    let regions = file
        .regions
        .into_iter()
        .map(|region| RawRegion {
            entry: ScopeEntry::new(region.value, region.name),
            sub_regions: region
                .sub_regions
                .into_iter()
                .map(|sub| RawSubRegion {
                    entry: ScopeEntry::new(sub.value, sub.name),
                    parts: sub.parts,
                })
                .collect(),
        })
        .collect();

    Ok(regions)
}

fn render_scope(regions: &[RawRegion]) -> Result<String> {
    let file = ScopeFile {
        regions: regions
            .iter()
            .map(|region| RegionRecord {
                value: region.entry.value.clone(),
                name: region.entry.name.clone(),
                sub_regions: region
                    .sub_regions
                    .iter()
                    .map(|sub| SubRegionRecord {
                        value: sub.entry.value.clone(),
                        name: sub.entry.name.clone(),
                        parts: sub.parts.clone(),
                    })
                    .collect(),
            })
            .collect(),
    };

    toml::to_string_pretty(&file).context("无法序列化范围文件")
}
