//! Statistics gathered while colliding a block of cells.

/// Running sums of the macroscopic state seen during one collision pass.
///
/// Dynamics without a fluid state (bounce-back, switched-off cells) do not
/// contribute.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BlockStatistics {
    sum_rho_bar: f64,
    sum_u_sqr: f64,
    max_u_sqr: f64,
    count: u64,
}

impl Default for BlockStatistics {
    fn default() -> Self {
        Self::new()
    }
}

impl BlockStatistics {
    pub const fn new() -> Self {
        Self {
            sum_rho_bar: 0.0,
            sum_u_sqr: 0.0,
            max_u_sqr: 0.0,
            count: 0,
        }
    }

    /// Record one cell.
    #[inline]
    pub fn gather(&mut self, rho_bar: f64, u_sqr: f64) {
        self.sum_rho_bar += rho_bar;
        self.sum_u_sqr += u_sqr;
        // NaN never wins a comparison; keep it visible.
        if u_sqr > self.max_u_sqr || u_sqr.is_nan() {
            self.max_u_sqr = u_sqr;
        }
        self.count += 1;
    }

    /// Combine two partial results.
    pub fn merged(mut self, other: Self) -> Self {
        self.sum_rho_bar += other.sum_rho_bar;
        self.sum_u_sqr += other.sum_u_sqr;
        if other.max_u_sqr > self.max_u_sqr || other.max_u_sqr.is_nan() {
            self.max_u_sqr = other.max_u_sqr;
        }
        self.count += other.count;
        self
    }

    /// Number of cells recorded.
    pub fn count(&self) -> u64 {
        self.count
    }

    /// Mean full density. 1 when nothing was recorded.
    pub fn average_density(&self) -> f64 {
        if self.count == 0 {
            return 1.0;
        }
        1.0 + self.sum_rho_bar / self.count as f64
    }

    /// Mean kinetic energy per unit mass, `<u²>/2`.
    pub fn average_energy(&self) -> f64 {
        if self.count == 0 {
            return 0.0;
        }
        0.5 * self.sum_u_sqr / self.count as f64
    }

    /// Largest velocity magnitude.
    pub fn max_velocity(&self) -> f64 {
        self.max_u_sqr.sqrt()
    }

    /// False once a non-finite value has been gathered.
    pub fn is_finite(&self) -> bool {
        self.sum_rho_bar.is_finite() && self.sum_u_sqr.is_finite() && self.max_u_sqr.is_finite()
    }
}
