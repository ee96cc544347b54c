use crate::domain::{Channel, CurveKey, Tier};

/// Top-level error carried to `main`, with the process exit code to use.
///
/// Exit codes: `2` for bad input (flags, files, budgets), `4` for internal
/// computation defects.
#[derive(Clone)]
pub struct AppError {
    exit_code: u8,
    message: String,
}

impl AppError {
    pub fn new(exit_code: u8, message: impl Into<String>) -> Self {
        Self {
            exit_code,
            message: message.into(),
        }
    }

    pub fn exit_code(&self) -> u8 {
        self.exit_code
    }
}

impl std::fmt::Display for AppError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::fmt::Debug for AppError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppError")
            .field("exit_code", &self.exit_code)
            .field("message", &self.message)
            .finish()
    }
}

impl std::error::Error for AppError {}

/// Failures of the curve model and allocator.
///
/// Everything here is a synchronous validation rejection; there is nothing
/// to retry.
#[derive(Debug, Clone, PartialEq)]
pub enum AllocError {
    /// Budget is negative or non-finite.
    InvalidBudget(f64),
    /// Step is zero, negative or non-finite.
    InvalidStep(f64),
    /// Spend grid cannot be built from the given step and cap.
    InvalidGrid { step: f64, max_spend: f64 },
    /// A curve's grid increment differs from the allocation step.
    GridMismatch { key: CurveKey, grid_step: f64, step: f64 },
    /// Generated parameters are not strictly positive. Indicates a bug in
    /// generation, not bad user input.
    DegenerateCurveParams { tier: Tier, channel: Channel },
    /// A key that does not belong to the curve set.
    UnknownCurve(CurveKey),
}

impl AllocError {
    /// Exit code used when this error reaches the binary.
    pub fn exit_code(&self) -> u8 {
        match self {
            AllocError::DegenerateCurveParams { .. } | AllocError::UnknownCurve(_) => 4,
            _ => 2,
        }
    }
}

impl std::fmt::Display for AllocError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AllocError::InvalidBudget(b) => {
                write!(f, "Invalid budget {b} (must be finite and >= 0).")
            }
            AllocError::InvalidStep(s) => write!(f, "Invalid step {s} (must be finite and > 0)."),
            AllocError::InvalidGrid { step, max_spend } => write!(
                f,
                "Invalid spend grid: step={step}, max_spend={max_spend} (max_spend must be a positive multiple of step)."
            ),
            AllocError::GridMismatch { key, grid_step, step } => write!(
                f,
                "Curve {key} uses a grid step of {grid_step}, but allocation step is {step}."
            ),
            AllocError::DegenerateCurveParams { tier, channel } => write!(
                f,
                "Degenerate curve parameters generated for {tier}/{channel}."
            ),
            AllocError::UnknownCurve(key) => write!(f, "Unknown curve key {key}."),
        }
    }
}

impl std::error::Error for AllocError {}

impl From<AllocError> for AppError {
    fn from(err: AllocError) -> Self {
        AppError::new(err.exit_code(), err.to_string())
    }
}
