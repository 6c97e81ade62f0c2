//! 元素与构造定义
//!
//! 每个元素由 `Definition` 描述如何从依赖计算出数值属性（`Geometry`）。
//! `dependencies` 始终等于 `definition` 引用的元素ID集合。

use crate::geometry::{Geometry, HyperbolaOrientation};
use crate::math::Point2;
use crate::transform::TriangleTransform;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;

/// 元素ID
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ElementId(pub u64);

impl ElementId {
    pub fn new(id: u64) -> Self {
        Self(id)
    }

    /// 从进程级计数器分配新ID
    pub fn next() -> Self {
        static NEXT_ID: std::sync::atomic::AtomicU64 = std::sync::atomic::AtomicU64::new(1);
        Self(NEXT_ID.fetch_add(1, std::sync::atomic::Ordering::Relaxed))
    }
}

impl fmt::Display for ElementId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// 元素类别
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ElementKind {
    Point,
    Line,
    Circle,
    Arc,
    Ellipse,
    Parabola,
    Hyperbola,
    Angle,
    Measurement,
    Function,
    SegmentMark,
    Text,
}

impl ElementKind {
    pub fn name(&self) -> &'static str {
        match self {
            ElementKind::Point => "Point",
            ElementKind::Line => "Line",
            ElementKind::Circle => "Circle",
            ElementKind::Arc => "Arc",
            ElementKind::Ellipse => "Ellipse",
            ElementKind::Parabola => "Parabola",
            ElementKind::Hyperbola => "Hyperbola",
            ElementKind::Angle => "Angle",
            ElementKind::Measurement => "Measurement",
            ElementKind::Function => "Function",
            ElementKind::SegmentMark => "SegmentMark",
            ElementKind::Text => "Text",
        }
    }
}

impl fmt::Display for ElementKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// RGBA 颜色
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl Color {
    pub const BLACK: Color = Color::rgb(0, 0, 0);
    pub const BLUE: Color = Color::rgb(33, 102, 172);
    pub const RED: Color = Color::rgb(204, 51, 51);
    pub const GRAY: Color = Color::rgb(128, 128, 128);

    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b, a: 255 }
    }
}

/// 显示样式
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Style {
    pub color: Color,
    pub stroke_width: f64,
    pub dashed: bool,
    pub fill_opacity: f64,
}

impl Default for Style {
    fn default() -> Self {
        Self {
            color: Color::BLACK,
            stroke_width: 1.5,
            dashed: false,
            fill_opacity: 0.0,
        }
    }
}

/// 构造定义
///
/// 除 `Free` 和纯方程定义外，所有变体都是依赖当前值的纯函数。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Definition {
    /// 用户自由放置
    Free,
    Midpoint {
        p1: ElementId,
        p2: ElementId,
    },
    LineFromPoints {
        p1: ElementId,
        p2: ElementId,
    },
    CircleByPoints {
        center: ElementId,
        edge: ElementId,
    },
    CircleByRadius {
        center: ElementId,
        radius: f64,
    },
    Angle3Points {
        p1: ElementId,
        vertex: ElementId,
        p2: ElementId,
    },
    EllipseByFoci {
        f1: ElementId,
        f2: ElementId,
        point_on: ElementId,
    },
    ParabolaByVertexFocus {
        vertex: ElementId,
        focus: ElementId,
    },
    ParabolaByFocusDirectrix {
        focus: ElementId,
        directrix: ElementId,
    },
    /// y = a(x-h)² + k
    ParabolaByEquation {
        a: f64,
        h: f64,
        k: f64,
    },
    HyperbolaByEquation {
        a: f64,
        b: f64,
        center_x: f64,
        center_y: f64,
        orientation: HyperbolaOrientation,
    },
    Incenter {
        p1: ElementId,
        p2: ElementId,
        p3: ElementId,
    },
    Circumcenter {
        p1: ElementId,
        p2: ElementId,
        p3: ElementId,
    },
    Incircle {
        p1: ElementId,
        p2: ElementId,
        p3: ElementId,
    },
    Circumcircle {
        p1: ElementId,
        p2: ElementId,
        p3: ElementId,
    },
    TangentPoint {
        circle: ElementId,
        external: ElementId,
        /// 0 或 1
        index: usize,
    },
    PerpendicularFoot {
        point: ElementId,
        line: ElementId,
    },
    ParallelLine {
        line: ElementId,
        through: ElementId,
    },
    PerpendicularLine {
        line: ElementId,
        through: ElementId,
    },
    Distance {
        p1: ElementId,
        p2: ElementId,
    },
    Radius {
        circle: ElementId,
    },
    SegmentMark {
        segment: ElementId,
        ticks: u8,
    },
    ArcByCenter {
        center: ElementId,
        start: ElementId,
        end: ElementId,
    },
    /// 相似/全等三角形的一个顶点，以 `anchor` 点为目标重心
    TransformedVertex {
        p1: ElementId,
        p2: ElementId,
        p3: ElementId,
        anchor: ElementId,
        index: usize,
        transform: TriangleTransform,
    },
}

impl Definition {
    pub fn is_free(&self) -> bool {
        matches!(self, Definition::Free)
    }

    /// 定义引用的元素ID（按声明顺序）
    pub fn dependencies(&self) -> Vec<ElementId> {
        match *self {
            Definition::Free
            | Definition::ParabolaByEquation { .. }
            | Definition::HyperbolaByEquation { .. } => Vec::new(),
            Definition::Midpoint { p1, p2 }
            | Definition::LineFromPoints { p1, p2 }
            | Definition::Distance { p1, p2 } => vec![p1, p2],
            Definition::CircleByPoints { center, edge } => vec![center, edge],
            Definition::CircleByRadius { center, .. } => vec![center],
            Definition::Angle3Points { p1, vertex, p2 } => vec![p1, vertex, p2],
            Definition::EllipseByFoci { f1, f2, point_on } => vec![f1, f2, point_on],
            Definition::ParabolaByVertexFocus { vertex, focus } => vec![vertex, focus],
            Definition::ParabolaByFocusDirectrix { focus, directrix } => vec![focus, directrix],
            Definition::Incenter { p1, p2, p3 }
            | Definition::Circumcenter { p1, p2, p3 }
            | Definition::Incircle { p1, p2, p3 }
            | Definition::Circumcircle { p1, p2, p3 } => vec![p1, p2, p3],
            Definition::TangentPoint {
                circle, external, ..
            } => vec![circle, external],
            Definition::PerpendicularFoot { point, line } => vec![point, line],
            Definition::ParallelLine { line, through }
            | Definition::PerpendicularLine { line, through } => vec![line, through],
            Definition::Radius { circle } => vec![circle],
            Definition::SegmentMark { segment, .. } => vec![segment],
            Definition::ArcByCenter { center, start, end } => vec![center, start, end],
            Definition::TransformedVertex {
                p1, p2, p3, anchor, ..
            } => vec![p1, p2, p3, anchor],
        }
    }

    pub fn references(&self, id: ElementId) -> bool {
        self.dependencies().contains(&id)
    }
}

/// 构造元素
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Element {
    pub id: ElementId,
    pub name: String,
    pub visible: bool,
    pub style: Style,
    pub dependencies: Vec<ElementId>,
    pub definition: Definition,
    pub geometry: Geometry,
}

impl Element {
    /// 创建元素，依赖列表由定义推导
    ///
    /// 派生元素的 `geometry` 只是占位值，插入 `ElementStore` 时重新计算。
    pub fn new(name: impl Into<String>, definition: Definition, geometry: Geometry) -> Self {
        Self::with_id(ElementId::next(), name, definition, geometry)
    }

    pub fn with_id(
        id: ElementId,
        name: impl Into<String>,
        definition: Definition,
        geometry: Geometry,
    ) -> Self {
        let dependencies = definition.dependencies();
        Self {
            id,
            name: name.into(),
            visible: true,
            style: Style::default(),
            dependencies,
            definition,
            geometry,
        }
    }

    /// 自由点
    pub fn free_point(name: impl Into<String>, x: f64, y: f64) -> Self {
        Self::new(name, Definition::Free, Geometry::Point(Point2::new(x, y)))
    }

    pub fn with_style(mut self, style: Style) -> Self {
        self.style = style;
        self
    }

    pub fn hidden(mut self) -> Self {
        self.visible = false;
        self
    }

    pub fn kind(&self) -> ElementKind {
        self.geometry.kind()
    }

    pub fn is_free(&self) -> bool {
        self.definition.is_free()
    }

    pub fn depends_on(&self, id: ElementId) -> bool {
        self.dependencies.contains(&id)
    }

    /// 依赖列表与定义引用集合一致
    pub fn dependencies_consistent(&self) -> bool {
        let declared: HashSet<ElementId> = self.dependencies.iter().copied().collect();
        let referenced: HashSet<ElementId> = self.definition.dependencies().into_iter().collect();
        declared == referenced
    }
}
