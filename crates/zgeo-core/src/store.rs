//! 元素存储
//!
//! 维护插入顺序、ID 索引和反向依赖索引。所有修改都在一次 `&mut self`
//! 调用内完成级联，保证派生元素始终与其依赖一致。

use crate::element::{Element, ElementId, ElementKind};
use crate::error::GraphError;
use crate::geometry::Geometry;
use crate::math::Point2;
use crate::propagation::{
    cascade, compute_with, DependencyIndex, Pending, PropagationConfig, PropagationReport,
    Resolve,
};
use std::collections::{HashMap, HashSet, VecDeque};

/// 构造元素集合
#[derive(Debug, Clone, Default)]
pub struct ElementStore {
    elements: Vec<Element>,
    positions: HashMap<ElementId, usize>,
    index: DependencyIndex,
    config: PropagationConfig,
}

impl ElementStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_config(config: PropagationConfig) -> Self {
        Self {
            config,
            ..Self::default()
        }
    }

    pub fn config(&self) -> &PropagationConfig {
        &self.config
    }

    /// 插入元素并立即计算其派生属性
    ///
    /// 依赖必须已经存在，因此经由存储构造的依赖图不会出现环。
    pub fn insert(&mut self, mut element: Element) -> Result<ElementId, GraphError> {
        let id = element.id;
        if self.positions.contains_key(&id) {
            return Err(GraphError::DuplicateId(id));
        }
        if !element.dependencies_consistent() {
            return Err(GraphError::DependencyMismatch(id));
        }
        if element.depends_on(id) {
            return Err(GraphError::SelfDependency(id));
        }
        if let Some(&missing) = element
            .dependencies
            .iter()
            .find(|dep| !self.positions.contains_key(*dep))
        {
            return Err(GraphError::MissingDependency {
                element: id,
                dependency: missing,
            });
        }

        if !element.is_free() {
            let computed = compute_with(&element, &Pending::new(self, &element), &self.config);
            match computed {
                Some(geometry) => element.geometry = geometry,
                None => tracing::debug!(element = %id, "initial compute failed, keeping provided geometry"),
            }
        }

        tracing::debug!(element = %id, name = %element.name, kind = %element.kind(), "element inserted");
        self.index.add(&element);
        self.positions.insert(id, self.elements.len());
        self.elements.push(element);
        Ok(id)
    }

    pub fn get(&self, id: ElementId) -> Option<&Element> {
        self.positions.get(&id).and_then(|&i| self.elements.get(i))
    }

    pub fn get_by_name(&self, name: &str) -> Option<&Element> {
        self.elements.iter().find(|e| e.name == name)
    }

    pub fn contains(&self, id: ElementId) -> bool {
        self.positions.contains_key(&id)
    }

    /// 按插入顺序遍历
    pub fn iter(&self) -> impl Iterator<Item = &Element> {
        self.elements.iter()
    }

    pub fn len(&self) -> usize {
        self.elements.len()
    }

    pub fn is_empty(&self) -> bool {
        self.elements.is_empty()
    }

    pub fn as_slice(&self) -> &[Element] {
        &self.elements
    }

    /// 直接依赖 `id` 的元素
    pub fn dependents_of(&self, id: ElementId) -> &[ElementId] {
        self.index.dependents_of(id)
    }

    /// 移动自由点并级联
    pub fn move_point(
        &mut self,
        id: ElementId,
        x: f64,
        y: f64,
    ) -> Result<PropagationReport, GraphError> {
        let el = self.get(id).ok_or(GraphError::NotFound(id))?;
        if !el.is_free() || el.kind() != ElementKind::Point {
            return Err(GraphError::NotFree(id));
        }
        self.set_geometry(id, Geometry::Point(Point2::new(x, y)))
    }

    /// 替换自由元素的几何值并级联
    pub fn set_geometry(
        &mut self,
        id: ElementId,
        geometry: Geometry,
    ) -> Result<PropagationReport, GraphError> {
        let &pos = self.positions.get(&id).ok_or(GraphError::NotFound(id))?;
        if !self.elements[pos].is_free() {
            return Err(GraphError::NotFree(id));
        }
        self.elements[pos].geometry = geometry;
        tracing::debug!(element = %id, "free element updated");
        Ok(self.cascade_from(id))
    }

    /// 以 `id` 为起点重新级联
    pub fn propagate_from(&mut self, id: ElementId) -> Result<PropagationReport, GraphError> {
        if !self.contains(id) {
            return Err(GraphError::NotFound(id));
        }
        Ok(self.cascade_from(id))
    }

    fn cascade_from(&mut self, id: ElementId) -> PropagationReport {
        cascade(
            id,
            &mut self.elements,
            &self.positions,
            &self.index,
            &self.config,
        )
    }

    /// 删除元素及其全部传递下游，返回按删除顺序排列的ID
    pub fn remove(&mut self, id: ElementId) -> Result<Vec<ElementId>, GraphError> {
        if !self.contains(id) {
            return Err(GraphError::NotFound(id));
        }

        let mut removed = Vec::new();
        let mut seen = HashSet::new();
        let mut queue = VecDeque::from([id]);
        while let Some(current) = queue.pop_front() {
            if !seen.insert(current) {
                continue;
            }
            removed.push(current);
            queue.extend(self.index.dependents_of(current).iter().copied());
        }

        for removed_id in &removed {
            if let Some(&pos) = self.positions.get(removed_id) {
                self.index.remove(&self.elements[pos]);
            }
        }
        self.elements.retain(|e| !seen.contains(&e.id));
        self.positions = self
            .elements
            .iter()
            .enumerate()
            .map(|(i, e)| (e.id, i))
            .collect();

        tracing::debug!(element = %id, removed = removed.len(), "element removed with dependents");
        Ok(removed)
    }
}

impl Resolve for ElementStore {
    fn resolve(&self, id: ElementId) -> Option<&Element> {
        self.get(id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::element::Definition;
    use approx::assert_relative_eq;

    fn placeholder() -> Geometry {
        Geometry::Point(Point2::origin())
    }

    fn point_at(store: &ElementStore, id: ElementId) -> Point2 {
        store.get(id).unwrap().geometry.as_point().unwrap()
    }

    #[test]
    fn test_insert_computes_immediately() {
        let mut store = ElementStore::new();
        let a = store.insert(Element::free_point("A", 0.0, 0.0)).unwrap();
        let b = store.insert(Element::free_point("B", 6.0, 2.0)).unwrap();
        let m = store
            .insert(Element::new("M", Definition::Midpoint { p1: a, p2: b }, placeholder()))
            .unwrap();

        assert_eq!(point_at(&store, m), Point2::new(3.0, 1.0));
        assert_eq!(store.len(), 3);
        assert_eq!(store.dependents_of(a), &[m]);
        assert_eq!(store.get_by_name("M").unwrap().id, m);
    }

    #[test]
    fn test_insert_validation() {
        let mut store = ElementStore::new();
        let a = store.insert(Element::free_point("A", 0.0, 0.0)).unwrap();

        let ghost = ElementId::next();
        let err = store
            .insert(Element::new("M", Definition::Midpoint { p1: a, p2: ghost }, placeholder()))
            .unwrap_err();
        assert!(matches!(err, GraphError::MissingDependency { dependency, .. } if dependency == ghost));

        let self_id = ElementId::next();
        let err = store
            .insert(Element::with_id(
                self_id,
                "S",
                Definition::Midpoint { p1: a, p2: self_id },
                placeholder(),
            ))
            .unwrap_err();
        assert_eq!(err, GraphError::SelfDependency(self_id));

        let mut mismatched =
            Element::new("N", Definition::Midpoint { p1: a, p2: a }, placeholder());
        mismatched.dependencies.clear();
        assert!(matches!(
            store.insert(mismatched),
            Err(GraphError::DependencyMismatch(_))
        ));

        let dup = store.get(a).unwrap().clone();
        assert_eq!(store.insert(dup), Err(GraphError::DuplicateId(a)));
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn test_move_point_cascades() {
        let mut store = ElementStore::new();
        let a = store.insert(Element::free_point("A", 0.0, 0.0)).unwrap();
        let b = store.insert(Element::free_point("B", 4.0, 0.0)).unwrap();
        let c = store.insert(Element::free_point("C", 0.0, 4.0)).unwrap();
        let cc = store
            .insert(Element::new(
                "circ",
                Definition::Circumcircle { p1: a, p2: b, p3: c },
                placeholder(),
            ))
            .unwrap();
        let r = store
            .insert(Element::new("r", Definition::Radius { circle: cc }, placeholder()))
            .unwrap();

        let report = store.move_point(b, 8.0, 0.0).unwrap();
        assert_eq!(report.recomputed, vec![cc, r]);
        assert!(!report.truncated);

        let circle = *store.get(cc).unwrap().geometry.as_circle().unwrap();
        assert_relative_eq!(circle.center.x, 4.0, epsilon = 1e-9);
        assert_relative_eq!(circle.center.y, 2.0, epsilon = 1e-9);
        match &store.get(r).unwrap().geometry {
            Geometry::Measurement(m) => assert_relative_eq!(m.value, circle.radius),
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_move_point_rejects_derived() {
        let mut store = ElementStore::new();
        let a = store.insert(Element::free_point("A", 0.0, 0.0)).unwrap();
        let b = store.insert(Element::free_point("B", 2.0, 0.0)).unwrap();
        let m = store
            .insert(Element::new("M", Definition::Midpoint { p1: a, p2: b }, placeholder()))
            .unwrap();
        assert_eq!(store.move_point(m, 1.0, 1.0), Err(GraphError::NotFree(m)));
        let ghost = ElementId::next();
        assert_eq!(store.move_point(ghost, 1.0, 1.0), Err(GraphError::NotFound(ghost)));
    }

    #[test]
    fn test_remove_cascades_transitively() {
        let mut store = ElementStore::new();
        let a = store.insert(Element::free_point("A", 0.0, 0.0)).unwrap();
        let b = store.insert(Element::free_point("B", 2.0, 0.0)).unwrap();
        let other = store.insert(Element::free_point("P", 5.0, 5.0)).unwrap();
        let m = store
            .insert(Element::new("M", Definition::Midpoint { p1: a, p2: b }, placeholder()))
            .unwrap();
        let l = store
            .insert(Element::new(
                "l",
                Definition::LineFromPoints { p1: m, p2: other },
                placeholder(),
            ))
            .unwrap();
        let d = store
            .insert(Element::new("d", Definition::Distance { p1: a, p2: m }, placeholder()))
            .unwrap();

        let removed = store.remove(a).unwrap();
        assert_eq!(removed[0], a);
        let removed_set: HashSet<_> = removed.iter().copied().collect();
        assert_eq!(removed_set, HashSet::from([a, m, l, d]));

        assert_eq!(store.len(), 2);
        assert!(store.get(b).is_some());
        assert!(store.get(other).is_some());
        assert!(store.dependents_of(b).is_empty());
        assert!(store.dependents_of(other).is_empty());

        // 剩余元素的依赖全部存在
        for el in store.iter() {
            for dep in &el.dependencies {
                assert!(store.contains(*dep));
            }
        }
        assert_eq!(store.remove(a), Err(GraphError::NotFound(a)));
    }

    #[test]
    fn test_set_geometry_on_free_function() {
        use crate::geometry::FunctionGraph;

        let mut store = ElementStore::new();
        let f = store
            .insert(Element::new(
                "f",
                Definition::Free,
                Geometry::Function(FunctionGraph::new("x")),
            ))
            .unwrap();
        let report = store
            .set_geometry(f, Geometry::Function(FunctionGraph::new("x^2")))
            .unwrap();
        assert!(report.recomputed.is_empty());
        match &store.get(f).unwrap().geometry {
            Geometry::Function(g) => assert_eq!(g.expression, "x^2"),
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_snap_follows_moved_construction() {
        use crate::snap::{SnapEngine, SnapType};

        let mut store = ElementStore::new();
        let a = store.insert(Element::free_point("A", 0.0, 0.0)).unwrap();
        let b = store.insert(Element::free_point("B", 4.0, 0.0)).unwrap();
        let m = store
            .insert(Element::new("M", Definition::Midpoint { p1: a, p2: b }, placeholder()))
            .unwrap();
        store.move_point(b, 8.0, 2.0).unwrap();

        let engine = SnapEngine::default();
        let r = engine.snap(Point2::new(4.1, 1.05), store.as_slice(), &[], None);
        assert_eq!(r.snap_type, Some(SnapType::Point));
        assert_eq!(r.element, Some(m));
        assert_relative_eq!(r.position.x, 4.0);
        assert_relative_eq!(r.position.y, 1.0);

        // 排除派生点后不再吸附到它
        let r = engine.snap(Point2::new(4.1, 1.05), store.as_slice(), &[m], None);
        assert_ne!(r.element, Some(m));
    }

    #[test]
    fn test_move_point_cascades_through_midpoint_ladder() {
        let mut store = ElementStore::new();
        let a = store.insert(Element::free_point("A", 0.0, 0.0)).unwrap();
        let b = store.insert(Element::free_point("B", 1.0, 0.0)).unwrap();
        let mut chain = vec![a, b];
        for i in 0..40 {
            let (p1, p2) = (chain[chain.len() - 2], chain[chain.len() - 1]);
            let m = store
                .insert(Element::new(
                    format!("M{}", i),
                    Definition::Midpoint { p1, p2 },
                    placeholder(),
                ))
                .unwrap();
            chain.push(m);
        }

        let report = store.move_point(a, 1000.0, 0.0).unwrap();
        assert!(!report.truncated);
        // 每个中点只重算一次
        assert_eq!(report.recomputed.len(), 40);
        assert_eq!(report.recomputed, chain[2..].to_vec());

        let mut xs = vec![1000.0, 1.0];
        for _ in 0..40 {
            let n = xs.len();
            xs.push((xs[n - 2] + xs[n - 1]) / 2.0);
        }
        for (id, x) in chain.iter().zip(&xs) {
            let p = point_at(&store, *id);
            assert_relative_eq!(p.x, *x, epsilon = 1e-9);
            assert_relative_eq!(p.y, 0.0);
        }
        let last = point_at(&store, chain[41]);
        assert!((last.x - 334.0).abs() < 1.0);
    }
}
