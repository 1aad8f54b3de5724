//! 范围模型
//!
//! 三级层次结构：地区 → 子地区 → 分卷。
//! 节点存放在一个 arena 中，`parent` 通过 [`NodeId`] 回指父节点。

use std::collections::HashSet;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::ScopeError;

/// 下拉框中的一个选项
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ScopeEntry {
    /// 表单值（用于选中该项）
    pub value: String,
    /// 显示名称
    pub name: String,
}

impl ScopeEntry {
    pub fn new(value: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            value: value.into(),
            name: name.into(),
        }
    }

    /// 表单值与名称相同的选项
    pub fn named(name: impl Into<String>) -> Self {
        let name = name.into();
        Self {
            value: name.clone(),
            name,
        }
    }
}

/// 节点层级
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NodeKind {
    Region,
    SubRegion,
    Part,
}

impl NodeKind {
    pub fn label(self) -> &'static str {
        match self {
            NodeKind::Region => "地区",
            NodeKind::SubRegion => "子地区",
            NodeKind::Part => "分卷",
        }
    }
}

impl fmt::Display for NodeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// arena 中的节点下标
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(usize);

/// 层次结构中的一个节点
#[derive(Debug, Clone)]
pub struct ScopeNode {
    pub kind: NodeKind,
    pub entry: ScopeEntry,
    /// 父节点（地区为 None）
    pub parent: Option<NodeId>,
    children: Vec<NodeId>,
}

impl ScopeNode {
    pub fn name(&self) -> &str {
        &self.entry.name
    }
}

/// 原始枚举结果：一个地区及其子地区
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawRegion {
    pub entry: ScopeEntry,
    pub sub_regions: Vec<RawSubRegion>,
}

/// 原始枚举结果：一个子地区及其分卷
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawSubRegion {
    pub entry: ScopeEntry,
    pub parts: Vec<ScopeEntry>,
}

/// 一个待下载的分卷
///
/// 创建后不可变，`key` 为 `地区/子地区/分卷`，作为进度存储的键。
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct WorkItem {
    region: ScopeEntry,
    sub_region: ScopeEntry,
    part: ScopeEntry,
    key: String,
}

impl WorkItem {
    pub fn new(region: ScopeEntry, sub_region: ScopeEntry, part: ScopeEntry) -> Self {
        let key = format!("{}/{}/{}", region.name, sub_region.name, part.name);
        Self {
            region,
            sub_region,
            part,
            key,
        }
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    pub fn region(&self) -> &ScopeEntry {
        &self.region
    }

    pub fn sub_region(&self) -> &ScopeEntry {
        &self.sub_region
    }

    pub fn part(&self) -> &ScopeEntry {
        &self.part
    }
}

impl fmt::Display for WorkItem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.key)
    }
}

/// 经过校验的范围模型
#[derive(Debug, Clone, Default)]
pub struct ScopeModel {
    nodes: Vec<ScopeNode>,
    roots: Vec<NodeId>,
}

impl ScopeModel {
    /// 校验原始枚举结果并构建范围模型
    ///
    /// - 地区或子地区没有子项 → `EmptyScope`
    /// - 同一父节点下重名 → `DuplicateName`
    /// - 名称含 `/` 导致两个分卷的键相同 → `DuplicateName`
    pub fn from_raw(regions: Vec<RawRegion>) -> Result<Self, ScopeError> {
        ensure_unique("<根>", regions.iter().map(|r| &r.entry))?;

        let mut model = ScopeModel::default();

        for region in regions {
            if region.sub_regions.is_empty() {
                return Err(ScopeError::EmptyScope {
                    kind: NodeKind::Region,
                    name: region.entry.name,
                });
            }
            ensure_unique(&region.entry.name, region.sub_regions.iter().map(|s| &s.entry))?;

            let region_name = region.entry.name.clone();
            let region_id = model.push(NodeKind::Region, region.entry, None);

            for sub_region in region.sub_regions {
                let sub_path = format!("{}/{}", region_name, sub_region.entry.name);
                if sub_region.parts.is_empty() {
                    return Err(ScopeError::EmptyScope {
                        kind: NodeKind::SubRegion,
                        name: sub_path,
                    });
                }
                ensure_unique(&sub_path, sub_region.parts.iter())?;

                let sub_id = model.push(NodeKind::SubRegion, sub_region.entry, Some(region_id));
                for part in sub_region.parts {
                    model.push(NodeKind::Part, part, Some(sub_id));
                }
            }
        }

        ensure_unique_keys(&model.work_items())?;
        Ok(model)
    }

    fn push(&mut self, kind: NodeKind, entry: ScopeEntry, parent: Option<NodeId>) -> NodeId {
        let id = NodeId(self.nodes.len());
        self.nodes.push(ScopeNode {
            kind,
            entry,
            parent,
            children: Vec::new(),
        });
        match parent {
            Some(parent) => self.nodes[parent.0].children.push(id),
            None => self.roots.push(id),
        }
        id
    }

    pub fn node(&self, id: NodeId) -> &ScopeNode {
        &self.nodes[id.0]
    }

    pub fn regions(&self) -> &[NodeId] {
        &self.roots
    }

    pub fn children(&self, id: NodeId) -> &[NodeId] {
        &self.nodes[id.0].children
    }

    /// 从地区到该节点的完整路径
    pub fn path(&self, id: NodeId) -> Vec<&ScopeNode> {
        let mut path = Vec::new();
        let mut current = Some(id);
        while let Some(node_id) = current {
            let node = self.node(node_id);
            path.push(node);
            current = node.parent;
        }
        path.reverse();
        path
    }

    /// 按 (地区, 子地区, 分卷) 顺序展开为工作项
    pub fn work_items(&self) -> Vec<WorkItem> {
        let mut items = Vec::with_capacity(self.part_count());
        for &region_id in &self.roots {
            let region = self.node(region_id);
            for &sub_id in self.children(region_id) {
                let sub_region = self.node(sub_id);
                for &part_id in self.children(sub_id) {
                    items.push(WorkItem::new(
                        region.entry.clone(),
                        sub_region.entry.clone(),
                        self.node(part_id).entry.clone(),
                    ));
                }
            }
        }
        items
    }

    pub fn region_count(&self) -> usize {
        self.roots.len()
    }

    pub fn sub_region_count(&self) -> usize {
        self.count(NodeKind::SubRegion)
    }

    pub fn part_count(&self) -> usize {
        self.count(NodeKind::Part)
    }

    fn count(&self, kind: NodeKind) -> usize {
        self.nodes.iter().filter(|n| n.kind == kind).count()
    }
}

fn ensure_unique<'a>(
    parent: &str,
    entries: impl Iterator<Item = &'a ScopeEntry>,
) -> Result<(), ScopeError> {
    let mut seen = HashSet::new();
    for entry in entries {
        if !seen.insert(entry.name.as_str()) {
            return Err(ScopeError::DuplicateName {
                parent: parent.to_string(),
                name: entry.name.clone(),
            });
        }
    }
    Ok(())
}

fn ensure_unique_keys(items: &[WorkItem]) -> Result<(), ScopeError> {
    let mut seen = HashSet::new();
    for item in items {
        if !seen.insert(item.key()) {
            return Err(ScopeError::DuplicateName {
                parent: "<根>".to_string(),
                name: item.key().to_string(),
            });
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sub(name: &str, parts: &[&str]) -> RawSubRegion {
        RawSubRegion {
            entry: ScopeEntry::named(name),
            parts: parts.iter().map(|p| ScopeEntry::named(*p)).collect(),
        }
    }

    fn region(name: &str, subs: Vec<RawSubRegion>) -> RawRegion {
        RawRegion {
            entry: ScopeEntry::named(name),
            sub_regions: subs,
        }
    }

    #[test]
    fn flattens_in_deterministic_order() {
        let model = ScopeModel::from_raw(vec![
            region("A", vec![sub("X", &["1", "2"]), sub("Y", &["1", "2"])]),
            region("B", vec![sub("Z", &["7"])]),
        ])
        .unwrap();

        let keys: Vec<_> = model
            .work_items()
            .iter()
            .map(|i| i.key().to_string())
            .collect();
        assert_eq!(keys, vec!["A/X/1", "A/X/2", "A/Y/1", "A/Y/2", "B/Z/7"]);
        assert_eq!(model.region_count(), 2);
        assert_eq!(model.sub_region_count(), 3);
        assert_eq!(model.part_count(), 5);
    }

    #[test]
    fn parts_point_back_to_their_region() {
        let model = ScopeModel::from_raw(vec![region("A", vec![sub("X", &["1"])])]).unwrap();
        let region_id = model.regions()[0];
        let sub_id = model.children(region_id)[0];
        let part_id = model.children(sub_id)[0];

        let path: Vec<_> = model.path(part_id).iter().map(|n| n.kind).collect();
        assert_eq!(
            path,
            vec![NodeKind::Region, NodeKind::SubRegion, NodeKind::Part]
        );
        assert_eq!(model.node(part_id).parent, Some(sub_id));
        assert_eq!(model.node(sub_id).parent, Some(region_id));
        assert_eq!(model.node(region_id).parent, None);
    }

    #[test]
    fn key_uses_names_not_form_values() {
        let item = WorkItem::new(
            ScopeEntry::new("13", "Malda"),
            ScopeEntry::new("44", "Habibpur"),
            ScopeEntry::new("101", "Part 12"),
        );
        assert_eq!(item.key(), "Malda/Habibpur/Part 12");
        assert_eq!(item.part().value, "101");
        assert_eq!(item.to_string(), item.key());
    }

    #[test]
    fn region_without_sub_regions_is_rejected() {
        let err = ScopeModel::from_raw(vec![region("A", vec![])]).unwrap_err();
        assert!(matches!(
            err,
            ScopeError::EmptyScope { kind: NodeKind::Region, ref name } if name == "A"
        ));
    }

    #[test]
    fn sub_region_without_parts_is_rejected() {
        let err = ScopeModel::from_raw(vec![region("A", vec![sub("X", &[])])]).unwrap_err();
        assert!(matches!(
            err,
            ScopeError::EmptyScope { kind: NodeKind::SubRegion, ref name } if name == "A/X"
        ));
    }

    #[test]
    fn duplicate_siblings_are_rejected() {
        let err = ScopeModel::from_raw(vec![region("A", vec![sub("X", &["1", "1"])])]).unwrap_err();
        assert!(matches!(err, ScopeError::DuplicateName { ref parent, .. } if parent == "A/X"));

        let err = ScopeModel::from_raw(vec![
            region("A", vec![sub("X", &["1"])]),
            region("A", vec![sub("Y", &["1"])]),
        ])
        .unwrap_err();
        assert!(matches!(err, ScopeError::DuplicateName { ref name, .. } if name == "A"));
    }

    #[test]
    fn slash_in_names_cannot_merge_two_parts() {
        let err = ScopeModel::from_raw(vec![
            region("A/B", vec![sub("C", &["1"])]),
            region("A", vec![sub("B/C", &["1"])]),
        ])
        .unwrap_err();
        assert!(matches!(err, ScopeError::DuplicateName { ref name, .. } if name == "A/B/C/1"));

        let model = ScopeModel::from_raw(vec![region("Ratua / West", vec![sub("X", &["1"])])])
            .unwrap();
        assert_eq!(model.work_items()[0].key(), "Ratua / West/X/1");
    }

    #[test]
    fn same_name_under_different_parents_is_fine() {
        let model = ScopeModel::from_raw(vec![region(
            "A",
            vec![sub("X", &["1"]), sub("Y", &["1"])],
        )])
        .unwrap();
        assert_eq!(model.work_items().len(), 2);
    }

    #[test]
    fn empty_enumeration_yields_no_items() {
        let model = ScopeModel::from_raw(Vec::new()).unwrap();
        assert!(model.work_items().is_empty());
    }
}
