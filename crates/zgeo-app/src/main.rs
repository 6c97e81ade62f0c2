//! ZGEO 命令行演示
//!
//! 搭建一个小型作图：三角形及其内切圆/外接圆、切点、圆锥曲线和函数图像，
//! 然后拖动一个自由点观察级联结果，并在若干位置演示捕捉。
//!
//! 用法：`zgeo [--verbose] [--config <path>]`

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::{info, warn, Level};
use tracing_subscriber::FmtSubscriber;

use zgeo_core::conic::{hyperbola_points, solve_t_max_for_viewport};
use zgeo_core::element::{Definition, Element, ElementId};
use zgeo_core::geometry::{FunctionGraph, Geometry, HyperbolaOrientation, Line};
use zgeo_core::math::{BoundingBox2, Point2};
use zgeo_core::prelude::{ElementStore, ExpressionFunctions, KernelConfig, SnapEngine};
use zgeo_core::transform::{get_triangle_bounds, transform_triangle, Flip, TriangleTransform};

/// 命令行参数
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// 输出调试日志
    #[arg(short, long)]
    verbose: bool,

    /// 内核配置文件（JSON）
    #[arg(short, long)]
    config: Option<PathBuf>,
}

fn placeholder() -> Geometry {
    Geometry::Point(Point2::origin())
}

fn describe(store: &ElementStore, id: ElementId) -> String {
    let Some(el) = store.get(id) else {
        return format!("{} <removed>", id);
    };
    let detail = match &el.geometry {
        Geometry::Point(p) => format!("({:.3}, {:.3})", p.x, p.y),
        Geometry::Circle(c) => format!(
            "center ({:.3}, {:.3}) r = {:.3}",
            c.center.x, c.center.y, c.radius
        ),
        Geometry::Measurement(m) => m.text.clone(),
        Geometry::Angle(a) => format!("{:.2}°{}", a.degrees, if a.right { " (right)" } else { "" }),
        other => other.type_name().to_string(),
    };
    format!("{} {}: {}", el.name, el.kind(), detail)
}

/// 搭建演示作图，返回需要展示的元素
fn build_scene(store: &mut ElementStore) -> Result<Vec<ElementId>> {
    let a = store.insert(Element::free_point("A", 0.0, 0.0))?;
    let b = store.insert(Element::free_point("B", 10.0, 0.0))?;
    let c = store.insert(Element::free_point("C", 0.0, 10.0))?;
    let p = store.insert(Element::free_point("P", 20.0, 5.0))?;

    let ab = store.insert(Element::new(
        "AB",
        Definition::LineFromPoints { p1: a, p2: b },
        Geometry::Line(Line::new(Point2::origin(), Point2::origin())),
    ))?;
    let mid = store.insert(Element::new("M", Definition::Midpoint { p1: a, p2: b }, placeholder()))?;
    let incircle = store.insert(Element::new(
        "incircle",
        Definition::Incircle { p1: a, p2: b, p3: c },
        placeholder(),
    ))?;
    let circumcircle = store.insert(Element::new(
        "circumcircle",
        Definition::Circumcircle { p1: a, p2: b, p3: c },
        placeholder(),
    ))?;
    let t0 = store.insert(Element::new(
        "T1",
        Definition::TangentPoint {
            circle: circumcircle,
            external: p,
            index: 0,
        },
        placeholder(),
    ))?;
    let angle = store.insert(Element::new(
        "∠BAC",
        Definition::Angle3Points {
            p1: b,
            vertex: a,
            p2: c,
        },
        placeholder(),
    ))?;
    let radius = store.insert(Element::new(
        "r",
        Definition::Radius { circle: circumcircle },
        placeholder(),
    ))?;
    let dist = store.insert(Element::new("|AP|", Definition::Distance { p1: a, p2: p }, placeholder()))?;
    let foot = store.insert(Element::new(
        "F",
        Definition::PerpendicularFoot { point: p, line: ab },
        placeholder(),
    ))?;
    let parabola = store.insert(Element::new(
        "parabola",
        Definition::ParabolaByVertexFocus { vertex: mid, focus: c },
        placeholder(),
    ))?;
    store.insert(Element::new(
        "hyperbola",
        Definition::HyperbolaByEquation {
            a: 3.0,
            b: 2.0,
            center_x: 30.0,
            center_y: 0.0,
            orientation: HyperbolaOrientation::Horizontal,
        },
        placeholder(),
    ))?;
    store.insert(Element::new(
        "f",
        Definition::Free,
        Geometry::Function(FunctionGraph::new("sin(x) * 3")),
    ))?;
    let similar = store.insert(Element::new(
        "A'",
        Definition::TransformedVertex {
            p1: a,
            p2: b,
            p3: c,
            anchor: p,
            index: 0,
            transform: TriangleTransform::new(0.5, 90.0, Flip::Horizontal),
        },
        placeholder(),
    ))?;

    Ok(vec![
        mid,
        incircle,
        circumcircle,
        t0,
        angle,
        radius,
        dist,
        foot,
        parabola,
        similar,
    ])
}

fn main() -> Result<()> {
    let args = Args::parse();

    // 初始化日志
    let level = if args.verbose { Level::DEBUG } else { Level::INFO };
    tracing::subscriber::set_global_default(FmtSubscriber::builder().with_max_level(level).finish())?;

    info!("Starting ZGEO...");

    let config = match &args.config {
        Some(path) => KernelConfig::load(path)
            .with_context(|| format!("failed to load config from {}", path.display()))?,
        None => KernelConfig::default(),
    };

    let mut store = ElementStore::with_config(config.propagation.clone());
    let shown = build_scene(&mut store)?;
    info!(elements = store.len(), "scene built");
    for id in &shown {
        println!("  {}", describe(&store, *id));
    }

    // 拖动 B，级联更新
    let b = store
        .get_by_name("B")
        .map(|e| e.id)
        .context("point B missing")?;
    let report = store.move_point(b, 12.0, 4.0)?;
    if report.truncated {
        warn!("propagation truncated");
    }
    info!(recomputed = report.recomputed.len(), "moved B to (12, 4)");
    for id in &shown {
        println!("  {}", describe(&store, *id));
    }

    // 捕捉
    let engine = SnapEngine::new(config.snap.clone());
    for query in [
        Point2::new(0.3, 0.2),
        Point2::new(6.2, 2.4),
        Point2::new(33.4, 0.5),
        Point2::new(-40.0, 2.5),
        Point2::new(100.0, 100.0),
    ] {
        let r = engine.snap(query, store.as_slice(), &[], Some(&ExpressionFunctions));
        match r.snap_type {
            Some(kind) => println!(
                "  snap ({:.1}, {:.1}) -> {} ({:.3}, {:.3}) {}",
                query.x,
                query.y,
                kind.name(),
                r.position.x,
                r.position.y,
                r.label
            ),
            None => println!("  snap ({:.1}, {:.1}) -> none", query.x, query.y),
        }
    }

    // 双曲线视口采样
    if let Some(Geometry::Hyperbola(h)) = store.get_by_name("hyperbola").map(|e| &e.geometry) {
        let viewport = BoundingBox2::new(Point2::new(0.0, -20.0), Point2::new(60.0, 20.0));
        let t_max = solve_t_max_for_viewport(h, &viewport);
        let samples = hyperbola_points(h, t_max, 64);
        info!(t_max, branch1 = samples.branch1.len(), branch2 = samples.branch2.len(), "hyperbola sampled");
    }

    let triangle = [Point2::new(0.0, 0.0), Point2::new(12.0, 4.0), Point2::new(0.0, 10.0)];
    let placed = transform_triangle(&triangle, &TriangleTransform::congruent(180.0, Flip::None), Point2::new(50.0, 50.0));
    let bounds = get_triangle_bounds(&placed);
    info!(
        min_x = bounds.min.x,
        min_y = bounds.min.y,
        max_x = bounds.max.x,
        max_y = bounds.max.y,
        "congruent triangle placed"
    );

    // 删除 A 会连带删除所有依赖它的元素
    let a = store
        .get_by_name("A")
        .map(|e| e.id)
        .context("point A missing")?;
    let removed = store.remove(a)?;
    info!(removed = removed.len(), remaining = store.len(), "removed A with dependents");

    Ok(())
}
