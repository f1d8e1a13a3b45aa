//! core/field.rs: dense 2D scalar fields for contour backgrounds.
//!
//! Fields are recomputed from their declared parameters every time; nothing
//! here is read from disk or cached.

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

fn origin() -> [f64; 2] {
    [0.0, 0.0]
}

/// Rectangular sampling lattice, endpoints included on both axes.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Grid2D {
    pub x_min: f64,
    pub x_max: f64,
    pub y_min: f64,
    pub y_max: f64,
    pub nx: usize,
    pub ny: usize,
}

impl Grid2D {
    /// Square lattice spanning `[-half_width, half_width]` on both axes.
    pub fn square(half_width: f64, n: usize) -> Self {
        Self {
            x_min: -half_width,
            x_max: half_width,
            y_min: -half_width,
            y_max: half_width,
            nx: n,
            ny: n,
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.nx < 2 || self.ny < 2 {
            return Err(Error::InvalidPlot(format!(
                "background grid needs at least 2x2 samples, got {}x{}",
                self.nx, self.ny
            )));
        }
        let finite = [self.x_min, self.x_max, self.y_min, self.y_max]
            .iter()
            .all(|v| v.is_finite());
        if !finite || self.x_max <= self.x_min || self.y_max <= self.y_min {
            return Err(Error::InvalidPlot(format!(
                "background grid extent [{}, {}] x [{}, {}] is empty or not finite",
                self.x_min, self.x_max, self.y_min, self.y_max
            )));
        }
        Ok(())
    }

    pub fn xs(&self) -> Vec<f64> {
        linspace(self.x_min, self.x_max, self.nx)
    }

    pub fn ys(&self) -> Vec<f64> {
        linspace(self.y_min, self.y_max, self.ny)
    }
}

fn linspace(lo: f64, hi: f64, n: usize) -> Vec<f64> {
    if n < 2 {
        return vec![lo; n];
    }
    let step = (hi - lo) / (n - 1) as f64;
    (0..n)
        .map(|i| if i + 1 == n { hi } else { lo + step * i as f64 })
        .collect()
}

/// Closed-form scalar potentials of two coordinates.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "kebab-case")]
pub enum Potential {
    /// `exp(-sigma^2 (r - r0)^2)`: a ring of height 1 at radius `r0`.
    Annular {
        #[serde(default = "origin")]
        center: [f64; 2],
        r0: f64,
        sigma: f64,
    },
    /// `amplitude * exp(-r^2 / (2 width^2))`.
    Gaussian {
        #[serde(default = "origin")]
        center: [f64; 2],
        amplitude: f64,
        width: f64,
    },
    /// `k r^2 / 2`.
    Harmonic {
        #[serde(default = "origin")]
        center: [f64; 2],
        k: f64,
    },
}

impl Potential {
    pub fn center(&self) -> [f64; 2] {
        match *self {
            Potential::Annular { center, .. }
            | Potential::Gaussian { center, .. }
            | Potential::Harmonic { center, .. } => center,
        }
    }

    #[inline]
    pub fn eval(&self, x: f64, y: f64) -> f64 {
        let [cx, cy] = self.center();
        let r2 = (x - cx).powi(2) + (y - cy).powi(2);
        match *self {
            Potential::Annular { r0, sigma, .. } => {
                let d = r2.sqrt() - r0;
                (-(sigma * sigma) * d * d).exp()
            }
            Potential::Gaussian {
                amplitude, width, ..
            } => amplitude * (-r2 / (2.0 * width * width)).exp(),
            Potential::Harmonic { k, .. } => 0.5 * k * r2,
        }
    }

    pub fn validate(&self) -> Result<()> {
        let ok = match *self {
            Potential::Annular { r0, sigma, .. } => r0.is_finite() && sigma.is_finite(),
            Potential::Gaussian {
                amplitude, width, ..
            } => amplitude.is_finite() && width.is_finite() && width != 0.0,
            Potential::Harmonic { k, .. } => k.is_finite(),
        };
        let [cx, cy] = self.center();
        if ok && cx.is_finite() && cy.is_finite() {
            Ok(())
        } else {
            Err(Error::InvalidPlot(format!(
                "potential parameters are not usable: {self:?}"
            )))
        }
    }
}

/// Values of a function sampled on a [`Grid2D`], row-major in y.
#[derive(Clone, Debug, PartialEq)]
pub struct ScalarField2D {
    pub xs: Vec<f64>,
    pub ys: Vec<f64>,
    /// `values[j * xs.len() + i] = f(xs[i], ys[j])`.
    pub values: Vec<f64>,
}

impl ScalarField2D {
    /// Sample `f` at every grid node.
    pub fn evaluate<F>(grid: &Grid2D, f: F) -> Result<Self>
    where
        F: Fn(f64, f64) -> f64,
    {
        grid.validate()?;
        let xs = grid.xs();
        let ys = grid.ys();
        let mut values = Vec::with_capacity(xs.len() * ys.len());
        for &y in &ys {
            for &x in &xs {
                values.push(f(x, y));
            }
        }
        Ok(Self { xs, ys, values })
    }

    pub fn from_potential(grid: &Grid2D, potential: &Potential) -> Result<Self> {
        potential.validate()?;
        Self::evaluate(grid, |x, y| potential.eval(x, y))
    }

    #[inline]
    pub fn nx(&self) -> usize {
        self.xs.len()
    }

    #[inline]
    pub fn ny(&self) -> usize {
        self.ys.len()
    }

    #[inline]
    pub fn at(&self, i: usize, j: usize) -> f64 {
        self.values[j * self.nx() + i]
    }

    /// (min, max) over finite samples; `(0, 1)` when none are finite.
    pub fn value_range(&self) -> (f64, f64) {
        let mut lo = f64::INFINITY;
        let mut hi = f64::NEG_INFINITY;
        for &v in &self.values {
            if v.is_finite() {
                lo = lo.min(v);
                hi = hi.max(v);
            }
        }
        if lo.is_finite() { (lo, hi) } else { (0.0, 1.0) }
    }

    /// `n_levels + 1` evenly spaced band edges covering the value range.
    pub fn level_edges(&self, n_levels: usize) -> Vec<f64> {
        let (lo, hi) = self.value_range();
        let n = n_levels.max(1);
        linspace(lo, hi, n + 1)
    }

    /// Mean of the four corners of cell `(i, j)`, the value a filled contour
    /// band is chosen by.
    pub fn cell_value(&self, i: usize, j: usize) -> f64 {
        0.25 * (self.at(i, j) + self.at(i + 1, j) + self.at(i, j + 1) + self.at(i + 1, j + 1))
    }
}

/// Index of the band `value` falls into, clamped to `0..n_levels`.
pub fn band_index(value: f64, lo: f64, hi: f64, n_levels: usize) -> usize {
    let n = n_levels.max(1);
    if !(hi > lo) || !value.is_finite() {
        return 0;
    }
    let t = ((value - lo) / (hi - lo)).clamp(0.0, 1.0);
    ((t * n as f64) as usize).min(n - 1)
}
