//! ZGEO 几何作图内核
//!
//! 提供动态几何作图所需的计算部分：构造算法、圆锥曲线生成、三角形变换、
//! 依赖传播以及捕捉/求交。
//!
//! # 架构设计
//!
//! 每个元素由 `Definition` 描述如何从其依赖得到几何值：
//! - `Element`: 标识、显示属性、依赖列表和当前几何值
//! - `propagation`: 按定义重算单个元素，并沿反向依赖索引级联
//! - `ElementStore`: 维护依赖不变式的元素集合
//! - `snap`: 光标捕捉与曲线求交
//!
//! 退化的几何输入不会 panic，而是返回 None、空列表或零半径。
//!
//! # 示例
//!
//! ```rust
//! use zgeo_core::prelude::*;
//!
//! let mut store = ElementStore::new();
//! let a = store.insert(Element::free_point("A", 0.0, 0.0)).unwrap();
//! let b = store.insert(Element::free_point("B", 4.0, 0.0)).unwrap();
//! let m = store
//!     .insert(Element::new(
//!         "M",
//!         Definition::Midpoint { p1: a, p2: b },
//!         Geometry::Point(Point2::origin()),
//!     ))
//!     .unwrap();
//!
//! store.move_point(b, 8.0, 2.0).unwrap();
//! assert_eq!(store.get(m).unwrap().geometry.as_point(), Some(Point2::new(4.0, 1.0)));
//! ```

pub mod config;
pub mod conic;
pub mod construct;
pub mod element;
pub mod error;
pub mod function;
pub mod geometry;
pub mod intersect;
pub mod math;
pub mod propagation;
pub mod snap;
pub mod store;
pub mod transform;

pub mod prelude {
    //! 常用类型的便捷导入
    pub use crate::config::KernelConfig;
    pub use crate::conic::{
        hyperbola_points, parabola_points_by_focus_directrix, parabola_points_by_vertex_focus,
        solve_t_max_for_viewport, HyperbolaSamples,
    };
    pub use crate::construct::{
        get_circumcenter, get_incenter, get_parallel_point, get_perpendicular_foot,
        get_tangent_points, TriangleCenter,
    };
    pub use crate::element::{Color, Definition, Element, ElementId, ElementKind, Style};
    pub use crate::error::{ComputeError, ConfigError, FunctionError, GraphError};
    pub use crate::function::{ExpressionFunction, ExpressionFunctions, FunctionSource, RealFunction};
    pub use crate::geometry::{
        Arc, Branch, Circle, Ellipse, Geometry, Hyperbola, HyperbolaOrientation, Line, LineExtent,
        Parabola,
    };
    pub use crate::math::{BoundingBox2, Point2, Vector2};
    pub use crate::propagation::{
        compute, propagate, propagate_with, PropagationConfig, PropagationReport, Resolve,
    };
    pub use crate::snap::{get_snap_position, SnapConfig, SnapEngine, SnapResult, SnapType};
    pub use crate::store::ElementStore;
    pub use crate::transform::{
        get_triangle_bounds, get_triangle_centroid, transform_triangle, Flip, TriangleTransform,
    };
}
