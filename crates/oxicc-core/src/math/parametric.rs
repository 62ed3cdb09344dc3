//! ICC parametric curve functions (types 0-4)
//!
//! As defined in ICC.1:2022 Section 10.18. Inputs are clamped to [0, 1];
//! outputs are not clamped here (the caller decides).

/// ICC Parametric Curve Type
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParametricCurveType {
    /// Type 0: Y = X^g
    Gamma,
    /// Type 1: Y = (aX + b)^g  if X >= -b/a, else 0
    Cie122,
    /// Type 2: Y = (aX + b)^g + c  if X >= -b/a, else c
    Iec61966_3,
    /// Type 3: Y = (aX + b)^g  if X >= d, else cX (sRGB-like)
    Iec61966_2_1,
    /// Type 4: Y = (aX + b)^g + e  if X >= d, else cX + f
    Full,
}

impl ParametricCurveType {
    /// Get the function type from its ICC code
    pub fn from_icc(function_type: u16) -> Option<Self> {
        match function_type {
            0 => Some(Self::Gamma),
            1 => Some(Self::Cie122),
            2 => Some(Self::Iec61966_3),
            3 => Some(Self::Iec61966_2_1),
            4 => Some(Self::Full),
            _ => None,
        }
    }

    pub fn to_icc(self) -> u16 {
        match self {
            Self::Gamma => 0,
            Self::Cie122 => 1,
            Self::Iec61966_3 => 2,
            Self::Iec61966_2_1 => 3,
            Self::Full => 4,
        }
    }

    /// Number of parameters stored for this type
    pub fn param_count(&self) -> usize {
        match self {
            Self::Gamma => 1,
            Self::Cie122 => 3,
            Self::Iec61966_3 => 4,
            Self::Iec61966_2_1 => 5,
            Self::Full => 7,
        }
    }
}

/// Decoded parametric curve, parameters in ICC order `g a b c d e f`
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ParametricCurve {
    pub curve_type: ParametricCurveType,
    pub g: f64,
    pub a: f64,
    pub b: f64,
    pub c: f64,
    pub d: f64,
    pub e: f64,
    pub f: f64,
}

impl ParametricCurve {
    /// Type 0 curve
    pub fn gamma(g: f64) -> Self {
        Self {
            curve_type: ParametricCurveType::Gamma,
            g,
            a: 1.0,
            b: 0.0,
            c: 0.0,
            d: 0.0,
            e: 0.0,
            f: 0.0,
        }
    }

    /// The sRGB transfer function as a type 3 curve
    pub fn srgb() -> Self {
        Self {
            curve_type: ParametricCurveType::Iec61966_2_1,
            g: 2.4,
            a: 1.0 / 1.055,
            b: 0.055 / 1.055,
            c: 1.0 / 12.92,
            d: 0.04045,
            e: 0.0,
            f: 0.0,
        }
    }

    /// Build from the ICC parameter list; None when too few parameters are given
    pub fn from_params(curve_type: ParametricCurveType, params: &[f64]) -> Option<Self> {
        if params.len() < curve_type.param_count() {
            return None;
        }
        let p = |i: usize| params.get(i).copied().unwrap_or(0.0);

        let mut curve = Self::gamma(p(0));
        curve.curve_type = curve_type;
        if curve_type != ParametricCurveType::Gamma {
            curve.a = p(1);
            curve.b = p(2);
            curve.c = p(3);
            curve.d = p(4);
            curve.e = p(5);
            curve.f = p(6);
        }
        Some(curve)
    }

    /// The stored parameter list in ICC order
    pub fn params(&self) -> Vec<f64> {
        let all = [self.g, self.a, self.b, self.c, self.d, self.e, self.f];
        all[..self.curve_type.param_count()].to_vec()
    }

    /// Evaluate (encoded → linear)
    #[inline]
    pub fn eval(&self, x: f64) -> f64 {
        let x = x.clamp(0.0, 1.0);
        let power = |v: f64| v.max(0.0).powf(self.g);
        let threshold = || if self.a.abs() > 1e-10 { -self.b / self.a } else { 0.0 };

        match self.curve_type {
            ParametricCurveType::Gamma => x.powf(self.g),
            ParametricCurveType::Cie122 => {
                if x >= threshold() {
                    power(self.a * x + self.b)
                } else {
                    0.0
                }
            }
            ParametricCurveType::Iec61966_3 => {
                if x >= threshold() {
                    power(self.a * x + self.b) + self.c
                } else {
                    self.c
                }
            }
            ParametricCurveType::Iec61966_2_1 => {
                if x >= self.d {
                    power(self.a * x + self.b)
                } else {
                    self.c * x
                }
            }
            ParametricCurveType::Full => {
                if x >= self.d {
                    power(self.a * x + self.b) + self.e
                } else {
                    self.c * x + self.f
                }
            }
        }
    }

    /// Evaluate in reverse (linear → encoded)
    ///
    /// Closed form for types 0 and 3, Newton iterations otherwise.
    pub fn eval_inverse(&self, y: f64) -> f64 {
        let y = y.clamp(0.0, 1.0);

        match self.curve_type {
            ParametricCurveType::Gamma if self.g.abs() > 1e-10 => y.powf(1.0 / self.g),
            ParametricCurveType::Iec61966_2_1 => {
                if y < self.c * self.d {
                    if self.c.abs() > 1e-10 { y / self.c } else { 0.0 }
                } else if self.a.abs() > 1e-10 && self.g.abs() > 1e-10 {
                    (y.powf(1.0 / self.g) - self.b) / self.a
                } else {
                    y
                }
            }
            _ => {
                let mut x = if self.g.abs() > 1e-10 {
                    y.powf(1.0 / self.g)
                } else {
                    y
                };
                for _ in 0..16 {
                    let fx = self.eval(x) - y;
                    if fx.abs() < 1e-12 {
                        break;
                    }
                    let h = 1e-8;
                    let dfx = (self.eval(x + h) - self.eval(x - h)) / (2.0 * h);
                    if dfx.abs() > 1e-10 {
                        x = (x - fx / dfx).clamp(0.0, 1.0);
                    }
                }
                x
            }
        }
    }
}
