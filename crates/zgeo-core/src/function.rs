//! 函数图像求值
//!
//! 内核只依赖 `RealFunction`（x -> Option<y>）这一约定；
//! `ExpressionFunction` 是基于 evalexpr 的默认实现。

use crate::element::{Element, ElementId};
use crate::error::FunctionError;
use crate::geometry::Geometry;
use evalexpr::{build_operator_tree, ContextWithMutableVariables, HashMapContext, Node, Value};

/// 单变量实函数；在该点无定义时返回 None
pub trait RealFunction {
    fn eval(&self, x: f64) -> Option<f64>;
}

impl<F> RealFunction for F
where
    F: Fn(f64) -> Option<f64>,
{
    fn eval(&self, x: f64) -> Option<f64> {
        self(x).filter(|y| y.is_finite())
    }
}

/// 可直接书写的函数名，编译前映射到 evalexpr 的 `math::` 内建函数
const MATH_FUNCTIONS: &[&str] = &[
    "sin", "cos", "tan", "asin", "acos", "atan", "sinh", "cosh", "tanh", "sqrt", "cbrt", "exp",
    "ln", "log2", "log10", "abs",
];

/// 用 evalexpr 编译的表达式，自变量为 `x`
#[derive(Debug, Clone)]
pub struct ExpressionFunction {
    source: String,
    tree: Node,
}

impl ExpressionFunction {
    pub fn parse(expression: &str) -> Result<Self, FunctionError> {
        let normalized = qualify_math_functions(expression);
        let tree =
            build_operator_tree(&normalized).map_err(|e| FunctionError::Parse(e.to_string()))?;
        Ok(Self {
            source: expression.to_string(),
            tree,
        })
    }

    pub fn source(&self) -> &str {
        &self.source
    }
}

impl RealFunction for ExpressionFunction {
    fn eval(&self, x: f64) -> Option<f64> {
        let mut context = HashMapContext::new();
        context.set_value("x".to_string(), Value::Float(x)).ok()?;
        context
            .set_value("pi".to_string(), Value::Float(std::f64::consts::PI))
            .ok()?;
        context
            .set_value("e".to_string(), Value::Float(std::f64::consts::E))
            .ok()?;

        let y = match self.tree.eval_with_context(&context).ok()? {
            Value::Float(f) => f,
            Value::Int(i) => i as f64,
            _ => return None,
        };
        y.is_finite().then_some(y)
    }
}

/// 把裸函数名 `sin(` 改写为 `math::sin(`，已限定的名称保持不变
fn qualify_math_functions(expression: &str) -> String {
    let chars: Vec<char> = expression.chars().collect();
    let mut out = String::with_capacity(expression.len() + 16);
    let mut i = 0;
    while i < chars.len() {
        let c = chars[i];
        if c.is_ascii_alphabetic() || c == '_' {
            let start = i;
            while i < chars.len() && (chars[i].is_ascii_alphanumeric() || chars[i] == '_') {
                i += 1;
            }
            let ident: String = chars[start..i].iter().collect();
            let qualified = start >= 2 && chars[start - 1] == ':' && chars[start - 2] == ':';
            if !qualified && MATH_FUNCTIONS.contains(&ident.as_str()) {
                out.push_str("math::");
            }
            out.push_str(&ident);
        } else {
            out.push(c);
            i += 1;
        }
    }
    out
}

/// 为函数元素提供求值器
pub trait FunctionSource {
    fn function_for(&self, element: &Element) -> Option<Box<dyn RealFunction + '_>>;
}

/// 默认来源：用 evalexpr 编译元素上的表达式，编译失败视为无定义
#[derive(Debug, Clone, Copy, Default)]
pub struct ExpressionFunctions;

impl FunctionSource for ExpressionFunctions {
    fn function_for(&self, element: &Element) -> Option<Box<dyn RealFunction + '_>> {
        match &element.geometry {
            Geometry::Function(graph) => match ExpressionFunction::parse(&graph.expression) {
                Ok(f) => Some(Box::new(f)),
                Err(e) => {
                    tracing::trace!(element = %element.id, error = %e, "function expression rejected");
                    None
                }
            },
            _ => None,
        }
    }
}

/// 由宿主预先编译好的求值器表
pub struct FunctionTable<'a> {
    entries: Vec<(ElementId, &'a dyn RealFunction)>,
}

impl<'a> FunctionTable<'a> {
    pub fn new() -> Self {
        Self {
            entries: Vec::new(),
        }
    }

    pub fn with(mut self, id: ElementId, function: &'a dyn RealFunction) -> Self {
        self.entries.push((id, function));
        self
    }
}

impl Default for FunctionTable<'_> {
    fn default() -> Self {
        Self::new()
    }
}

struct Borrowed<'a>(&'a dyn RealFunction);

impl RealFunction for Borrowed<'_> {
    fn eval(&self, x: f64) -> Option<f64> {
        self.0.eval(x)
    }
}

impl FunctionSource for FunctionTable<'_> {
    fn function_for(&self, element: &Element) -> Option<Box<dyn RealFunction + '_>> {
        self.entries
            .iter()
            .find(|(id, _)| *id == element.id)
            .map(|(_, f)| Box::new(Borrowed(*f)) as Box<dyn RealFunction + '_>)
    }
}
