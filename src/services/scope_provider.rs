//! 范围枚举服务 - 业务能力层
//!
//! 只负责"列出某个父节点下的子项"，不关心下载流程

use std::collections::HashMap;
use std::path::Path;

use anyhow::Result;
use async_trait::async_trait;
use tracing::{info, warn};

use crate::error::ScopeError;
use crate::models::{load_scope_file, RawRegion, RawSubRegion, ScopeEntry};

/// 范围枚举提供者
///
/// 每个方法返回给定父节点当前的子项，失败时返回 `EnumerationUnavailable`。
#[async_trait]
pub trait ScopeProvider: Send {
    async fn regions(&mut self) -> Result<Vec<ScopeEntry>, ScopeError>;

    async fn sub_regions(&mut self, region: &ScopeEntry) -> Result<Vec<ScopeEntry>, ScopeError>;

    async fn parts(
        &mut self,
        region: &ScopeEntry,
        sub_region: &ScopeEntry,
    ) -> Result<Vec<ScopeEntry>, ScopeError>;
}

/// 处理单个地区还是全部地区
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum RegionSelection {
    #[default]
    All,
    /// 名称匹配（忽略大小写；存在完全相同的名称时只保留完全匹配项）
    Named(String),
}

impl RegionSelection {
    pub fn from_option(name: Option<String>) -> Self {
        match name {
            Some(name) if !name.trim().is_empty() => RegionSelection::Named(name.trim().to_string()),
            _ => RegionSelection::All,
        }
    }

    pub fn filter(&self, regions: Vec<ScopeEntry>) -> Result<Vec<ScopeEntry>, ScopeError> {
        let requested = match self {
            RegionSelection::All => return Ok(regions),
            RegionSelection::Named(name) => name,
        };
        let wanted = requested.to_lowercase();

        let exact: Vec<_> = regions
            .iter()
            .filter(|r| r.name.to_lowercase() == wanted)
            .cloned()
            .collect();
        let selected = if exact.is_empty() {
            regions
                .into_iter()
                .filter(|r| r.name.to_lowercase().contains(&wanted))
                .collect()
        } else {
            exact
        };

        if selected.is_empty() {
            return Err(ScopeError::RegionNotFound {
                name: requested.clone(),
            });
        }
        Ok(selected)
    }
}

/// 遍历提供者，收集原始枚举结果
///
/// 某个地区或子地区的子项读取失败时跳过该子树并继续处理兄弟节点；
/// 顶层地区列表读取失败则直接返回错误。
pub async fn discover<P: ScopeProvider + ?Sized>(
    provider: &mut P,
    selection: &RegionSelection,
) -> Result<Vec<RawRegion>, ScopeError> {
    let regions = selection.filter(provider.regions().await?)?;
    info!("🗺️ 共 {} 个地区待读取", regions.len());

    let mut raw_regions = Vec::with_capacity(regions.len());

    for region in regions {
        info!("🗺️ 正在读取地区: {}", region.name);

        let sub_entries = match provider.sub_regions(&region).await {
            Ok(entries) => entries,
            Err(e) if e.is_subtree_local() => {
                warn!("⚠️ 跳过地区 {}: {}", region.name, e);
                continue;
            }
            Err(e) => return Err(e),
        };

        let listed = sub_entries.len();
        let mut sub_regions = Vec::with_capacity(listed);
        for sub_region in sub_entries {
            match provider.parts(&region, &sub_region).await {
                Ok(parts) => {
                    info!("  ✓ {}/{}: {} 个分卷", region.name, sub_region.name, parts.len());
                    sub_regions.push(RawSubRegion {
                        entry: sub_region,
                        parts,
                    });
                }
                Err(e) if e.is_subtree_local() => {
                    warn!("⚠️ 跳过子地区 {}/{}: {}", region.name, sub_region.name, e);
                }
                Err(e) => return Err(e),
            }
        }

        // 子地区全部读取失败时整个地区一并跳过，避免被误判为空范围
        if listed > 0 && sub_regions.is_empty() {
            warn!("⚠️ 地区 {} 的所有子地区都无法读取，已跳过", region.name);
            continue;
        }

        raw_regions.push(RawRegion {
            entry: region,
            sub_regions,
        });
    }

    Ok(raw_regions)
}

/// 基于 TOML 范围文件（或内存数据）的提供者
#[derive(Debug, Clone, Default)]
pub struct TomlScopeProvider {
    regions: Vec<ScopeEntry>,
    sub_regions: HashMap<String, Vec<ScopeEntry>>,
    parts: HashMap<(String, String), Vec<ScopeEntry>>,
}

impl TomlScopeProvider {
    pub async fn load(path: &Path) -> Result<Self> {
        let regions = load_scope_file(path).await?;
        Ok(Self::from_regions(regions))
    }

    pub fn from_regions(regions: Vec<RawRegion>) -> Self {
        let mut provider = Self::default();
        for region in regions {
            let mut subs = Vec::with_capacity(region.sub_regions.len());
            for sub in region.sub_regions {
                provider.parts.insert(
                    (region.entry.value.clone(), sub.entry.value.clone()),
                    sub.parts,
                );
                subs.push(sub.entry);
            }
            provider
                .sub_regions
                .insert(region.entry.value.clone(), subs);
            provider.regions.push(region.entry);
        }
        provider
    }
}

#[async_trait]
impl ScopeProvider for TomlScopeProvider {
    async fn regions(&mut self) -> Result<Vec<ScopeEntry>, ScopeError> {
        Ok(self.regions.clone())
    }

    async fn sub_regions(&mut self, region: &ScopeEntry) -> Result<Vec<ScopeEntry>, ScopeError> {
        self.sub_regions
            .get(&region.value)
            .cloned()
            .ok_or_else(|| ScopeError::enumeration_unavailable(&region.name, "范围文件中没有该地区"))
    }

    async fn parts(
        &mut self,
        region: &ScopeEntry,
        sub_region: &ScopeEntry,
    ) -> Result<Vec<ScopeEntry>, ScopeError> {
        self.parts
            .get(&(region.value.clone(), sub_region.value.clone()))
            .cloned()
            .ok_or_else(|| {
                ScopeError::enumeration_unavailable(
                    format!("{}/{}", region.name, sub_region.name),
                    "范围文件中没有该子地区",
                )
            })
    }
}
