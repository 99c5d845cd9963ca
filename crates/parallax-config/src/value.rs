// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Typed literals and parse-time built-in functions.

use core::fmt;
use core::str::FromStr;

use parallax_geom::BoundingSphere;
use parallax_math::{deg_to_rad, Mat3, Mat4, Vec3, Vec4};

use crate::sexpr::{Node, SExpr};

/// An evaluated command argument.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    /// Number.
    Number(f64),
    /// Quoted string.
    Str(String),
    /// `true` / `false` (any case).
    Bool(bool),
    /// Bare word: names, policy spellings.
    Word(String),
    /// `(x y)`.
    Vec2([f64; 2]),
    /// `(x y z)`.
    Vec3(Vec3),
    /// `(x y z w)`.
    Vec4(Vec4),
    /// Three rows of three numbers.
    Mat3(Mat3),
    /// Four rows of four numbers, three rows of four (affine), or a
    /// transform built-in.
    Mat4(Mat4),
    /// `(BoundingSphere center radius)`.
    Sphere(BoundingSphere),
    /// Any other list.
    List(Vec<Value>),
}

impl Value {
    /// Short type description for error messages.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Number(_) => "number",
            Self::Str(_) => "string",
            Self::Bool(_) => "boolean",
            Self::Word(_) => "word",
            Self::Vec2(_) => "2-vector",
            Self::Vec3(_) => "3-vector",
            Self::Vec4(_) => "4-vector",
            Self::Mat3(_) => "3x3 matrix",
            Self::Mat4(_) => "4x4 matrix",
            Self::Sphere(_) => "bounding sphere",
            Self::List(_) => "list",
        }
    }

    fn expected(&self, what: &str) -> String {
        format!("expected {what}, found {}", self.kind())
    }

    /// The number.
    ///
    /// # Errors
    /// A message naming the actual type.
    pub fn as_number(&self) -> Result<f64, String> {
        match self {
            Self::Number(n) => Ok(*n),
            other => Err(other.expected("a number")),
        }
    }

    /// A non-negative integer.
    ///
    /// # Errors
    /// A message when the value is not a whole non-negative number.
    pub fn as_index(&self) -> Result<u32, String> {
        let n = self.as_number()?;
        if n >= 0.0 && n.fract() == 0.0 && n <= f64::from(u32::MAX) {
            Ok(n as u32)
        } else {
            Err(format!("expected a non-negative integer, found {n}"))
        }
    }

    /// Word or string text.
    ///
    /// # Errors
    /// A message naming the actual type.
    pub fn as_name(&self) -> Result<&str, String> {
        match self {
            Self::Word(w) | Self::Str(w) => Ok(w),
            other => Err(other.expected("a name")),
        }
    }

    /// The boolean.
    ///
    /// # Errors
    /// A message naming the actual type.
    pub fn as_bool(&self) -> Result<bool, String> {
        match self {
            Self::Bool(b) => Ok(*b),
            other => Err(other.expected("a boolean")),
        }
    }

    /// The 2-vector.
    ///
    /// # Errors
    /// A message naming the actual type.
    pub fn as_vec2(&self) -> Result<[f64; 2], String> {
        match self {
            Self::Vec2(v) => Ok(*v),
            other => Err(other.expected("a 2-vector")),
        }
    }

    /// The 3-vector.
    ///
    /// # Errors
    /// A message naming the actual type.
    pub fn as_vec3(&self) -> Result<Vec3, String> {
        match self {
            Self::Vec3(v) => Ok(*v),
            other => Err(other.expected("a 3-vector")),
        }
    }

    /// A transform: 4x4 matrices as is, 3x3 matrices as rotations.
    ///
    /// # Errors
    /// A message naming the actual type.
    pub fn as_mat4(&self) -> Result<Mat4, String> {
        match self {
            Self::Mat4(m) => Ok(*m),
            Self::Mat3(m) => Ok(m.to_mat4()),
            other => Err(other.expected("a matrix")),
        }
    }

    /// A policy spelling parsed into `P`.
    ///
    /// # Errors
    /// A message when the word is not a spelling of `P`.
    pub fn as_policy<P>(&self) -> Result<P, String>
    where
        P: FromStr,
        P::Err: fmt::Display,
    {
        self.as_name()?.parse::<P>().map_err(|e| e.to_string())
    }

    /// Evaluates an argument expression, running built-ins.
    ///
    /// # Errors
    /// A message for malformed built-in calls.
    pub fn eval(node: &Node) -> Result<Self, String> {
        match &node.expr {
            SExpr::Number(n) => Ok(Self::Number(*n)),
            SExpr::Str(s) => Ok(Self::Str(s.clone())),
            SExpr::Word(w) if w.eq_ignore_ascii_case("true") => Ok(Self::Bool(true)),
            SExpr::Word(w) if w.eq_ignore_ascii_case("false") => Ok(Self::Bool(false)),
            SExpr::Word(w) => Ok(Self::Word(w.clone())),
            SExpr::List(items) => {
                if let Some(builtin) = node.head_word().and_then(Builtin::lookup) {
                    let args = items[1..].iter().map(Self::eval).collect::<Result<Vec<_>, _>>()?;
                    return builtin.call(&args);
                }
                let values = items.iter().map(Self::eval).collect::<Result<Vec<_>, _>>()?;
                Ok(Self::from_list(values))
            }
        }
    }

    fn from_list(values: Vec<Self>) -> Self {
        let numbers: Option<Vec<f64>> = values.iter().map(|v| v.as_number().ok()).collect();
        if let Some(n) = numbers {
            return match n.as_slice() {
                &[x, y] => Self::Vec2([x, y]),
                &[x, y, z] => Self::Vec3(Vec3::new(x, y, z)),
                &[x, y, z, w] => Self::Vec4(Vec4::new(x, y, z, w)),
                _ => Self::List(values),
            };
        }
        let rows3: Option<Vec<Vec3>> = values.iter().map(|v| v.as_vec3().ok()).collect();
        if let Some(r) = rows3.filter(|r| r.len() == 3) {
            return Self::Mat3(Mat3::from_rows(r[0].to_array(), r[1].to_array(), r[2].to_array()));
        }
        let rows4: Option<Vec<[f64; 4]>> = values
            .iter()
            .map(|v| match v {
                Self::Vec4(r) => Some(r.to_array()),
                _ => None,
            })
            .collect();
        match rows4.as_deref() {
            Some(&[r0, r1, r2]) => Self::Mat4(Mat4::from_rows([r0, r1, r2, [0.0, 0.0, 0.0, 1.0]])),
            Some(&[r0, r1, r2, r3]) => Self::Mat4(Mat4::from_rows([r0, r1, r2, r3])),
            _ => Self::List(values),
        }
    }
}

/// Functions evaluated while reading.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Builtin {
    Translate,
    Rotate,
    Concatenate,
    RotateTranslate,
    TranslateRotate,
    BoundingSphere,
}

impl Builtin {
    fn lookup(name: &str) -> Option<Self> {
        Some(match name {
            "Translate" => Self::Translate,
            "Rotate" => Self::Rotate,
            "Concatenate" => Self::Concatenate,
            "RotateTranslate" => Self::RotateTranslate,
            "TranslateRotate" => Self::TranslateRotate,
            "BoundingSphere" => Self::BoundingSphere,
            _ => return None,
        })
    }

    fn arity(args: &[Value], n: usize, name: &str) -> Result<(), String> {
        if args.len() == n {
            Ok(())
        } else {
            Err(format!("{name} takes {n} arguments, found {}", args.len()))
        }
    }

    fn xyz(args: &[Value], name: &str) -> Result<(f64, f64, f64), String> {
        Self::arity(args, 3, name)?;
        Ok((args[0].as_number()?, args[1].as_number()?, args[2].as_number()?))
    }

    fn pair(args: &[Value], name: &str) -> Result<(Mat4, Mat4), String> {
        Self::arity(args, 2, name)?;
        Ok((args[0].as_mat4()?, args[1].as_mat4()?))
    }

    fn call(self, args: &[Value]) -> Result<Value, String> {
        let m = match self {
            Self::Translate => {
                let (x, y, z) = Self::xyz(args, "Translate")?;
                Mat4::translation(x, y, z)
            }
            Self::Rotate => {
                let (x, y, z) = Self::xyz(args, "Rotate")?;
                Mat4::rotation_euler_xyz(deg_to_rad(x), deg_to_rad(y), deg_to_rad(z))
            }
            // First argument applied first.
            Self::Concatenate => {
                let (a, b) = Self::pair(args, "Concatenate")?;
                b * a
            }
            Self::RotateTranslate => {
                let (r, t) = Self::pair(args, "RotateTranslate")?;
                t * r
            }
            Self::TranslateRotate => {
                let (t, r) = Self::pair(args, "TranslateRotate")?;
                r * t
            }
            Self::BoundingSphere => {
                Self::arity(args, 2, "BoundingSphere")?;
                let center = args[0].as_vec3()?;
                let sphere = match &args[1] {
                    Value::Word(w) if w.eq_ignore_ascii_case("Infinite") => {
                        let mut s = BoundingSphere::infinite();
                        s.center = center;
                        s
                    }
                    other => BoundingSphere::new(center, other.as_number()?),
                };
                return Ok(Value::Sphere(sphere));
            }
        };
        Ok(Value::Mat4(m))
    }
}
