//! Shared domain types.
//!
//! These types are intentionally kept lightweight and serializable so they can be:
//!
//! - received from the external record store (JSON)
//! - framed into datasets for training and scoring
//! - echoed back to callers as prediction results

use serde::{Deserialize, Serialize};

/// Pass-through row identifier (never a feature).
pub const ID_COLUMN: &str = "id";

/// Binary label: 1 = the client defaulted on the next payment.
pub const LABEL_COLUMN: &str = "default";

/// Canonical model input columns, in the order records are framed.
pub const FEATURE_COLUMNS: [&str; 23] = [
    "limit_bal",
    "sex",
    "education",
    "marriage",
    "age",
    "repay_status_1",
    "repay_status_2",
    "repay_status_3",
    "repay_status_4",
    "repay_status_5",
    "repay_status_6",
    "bill_amount_1",
    "bill_amount_2",
    "bill_amount_3",
    "bill_amount_4",
    "bill_amount_5",
    "bill_amount_6",
    "pay_amount_1",
    "pay_amount_2",
    "pay_amount_3",
    "pay_amount_4",
    "pay_amount_5",
    "pay_amount_6",
];

pub const REPAY_STATUS_PREFIX: &str = "repay_";

pub const BILL_AMOUNT_COLUMNS: [&str; 6] = [
    "bill_amount_1",
    "bill_amount_2",
    "bill_amount_3",
    "bill_amount_4",
    "bill_amount_5",
    "bill_amount_6",
];

/// Numeric columns with at most this many distinct values are treated as categorical.
pub const DEFAULT_CARDINALITY_THRESHOLD: usize = 12;

/// A closed categorical domain with a stable name <-> code bijection.
///
/// Codes exist only for model input; display always goes through `name()`.
pub trait CategoricalDomain: Sized + Copy + PartialEq + 'static {
    /// Dataset column this domain is stored in.
    const COLUMN: &'static str;
    /// `(member, name, code)` for every member of the domain.
    const TABLE: &'static [(Self, &'static str, u8)];

    fn code(self) -> u8 {
        Self::TABLE
            .iter()
            .find(|(m, _, _)| *m == self)
            .map(|(_, _, c)| *c)
            .unwrap_or_default()
    }

    fn name(self) -> &'static str {
        Self::TABLE
            .iter()
            .find(|(m, _, _)| *m == self)
            .map(|(_, n, _)| *n)
            .unwrap_or_default()
    }

    fn from_code(code: u8) -> Option<Self> {
        Self::TABLE.iter().find(|(_, _, c)| *c == code).map(|(m, _, _)| *m)
    }

    fn from_name(name: &str) -> Option<Self> {
        let name = name.trim();
        Self::TABLE
            .iter()
            .find(|(_, n, _)| n.eq_ignore_ascii_case(name))
            .map(|(m, _, _)| *m)
    }

    fn codes() -> Vec<u8> {
        Self::TABLE.iter().map(|(_, _, c)| *c).collect()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Sex {
    Male,
    Female,
}

impl CategoricalDomain for Sex {
    const COLUMN: &'static str = "sex";
    const TABLE: &'static [(Self, &'static str, u8)] = &[(Sex::Male, "male", 1), (Sex::Female, "female", 2)];
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Education {
    GraduateSchool,
    University,
    HighSchool,
    Others,
}

impl CategoricalDomain for Education {
    const COLUMN: &'static str = "education";
    const TABLE: &'static [(Self, &'static str, u8)] = &[
        (Education::GraduateSchool, "graduate_school", 1),
        (Education::University, "university", 2),
        (Education::HighSchool, "high_school", 3),
        (Education::Others, "others", 4),
    ];
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Marriage {
    Married,
    Single,
    Others,
}

impl CategoricalDomain for Marriage {
    const COLUMN: &'static str = "marriage";
    const TABLE: &'static [(Self, &'static str, u8)] = &[
        (Marriage::Married, "married", 1),
        (Marriage::Single, "single", 2),
        (Marriage::Others, "others", 3),
    ];
}

/// One client's input attributes, with categorical fields as domain values.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeatureRecord {
    pub limit_bal: u64,
    pub sex: Sex,
    pub education: Education,
    pub marriage: Marriage,
    pub age: u32,
    /// Repayment status per billing period, most recent first.
    pub repay_status: [i32; 6],
    pub bill_amount: [f64; 6],
    pub pay_amount: [f64; 6],
}

impl FeatureRecord {
    /// Check the ranges the record layer is expected to enforce.
    pub fn validate(&self) -> Result<(), String> {
        if self.limit_bal == 0 {
            return Err("`limit_bal` must be > 0.".to_string());
        }
        if self.age == 0 {
            return Err("`age` must be > 0.".to_string());
        }
        for (i, s) in self.repay_status.iter().enumerate() {
            if !(-1..=9).contains(s) {
                return Err(format!("`repay_status_{}` must be in [-1, 9], got {s}.", i + 1));
            }
        }
        for (label, values) in [("bill_amount", &self.bill_amount), ("pay_amount", &self.pay_amount)] {
            for (i, v) in values.iter().enumerate() {
                if !v.is_finite() || *v < 0.0 {
                    return Err(format!("`{label}_{}` must be finite and >= 0, got {v}.", i + 1));
                }
            }
        }
        Ok(())
    }

    /// Model input values in `FEATURE_COLUMNS` order, categorical fields as codes.
    pub fn feature_values(&self) -> [f64; 23] {
        let mut out = [0.0; 23];
        out[0] = self.limit_bal as f64;
        out[1] = f64::from(self.sex.code());
        out[2] = f64::from(self.education.code());
        out[3] = f64::from(self.marriage.code());
        out[4] = f64::from(self.age);
        for i in 0..6 {
            out[5 + i] = f64::from(self.repay_status[i]);
            out[11 + i] = self.bill_amount[i];
            out[17 + i] = self.pay_amount[i];
        }
        out
    }
}

/// Scoring output for one record.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PredictionResult {
    pub default: bool,
    /// Probability of the predicted class (not necessarily the positive one).
    pub confidence: f64,
}

impl PredictionResult {
    /// Decide from a two-class probability vector `[P(no default), P(default)]`.
    ///
    /// Ties go to the negative class, like an argmax over `[p0, p1]`.
    pub fn from_proba(p0: f64, p1: f64) -> Self {
        let default = p1 > p0;
        let confidence = if default { p1 } else { p0 };
        Self {
            default,
            confidence: confidence.clamp(0.0, 1.0),
        }
    }
}

/// A served prediction as stored by the record layer, with its optional ground truth.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OutcomeRecord {
    pub prediction_id: u64,
    #[serde(flatten)]
    pub features: FeatureRecord,
    #[serde(flatten)]
    pub prediction: Option<PredictionResult>,
    /// `None` until the real outcome has been confirmed.
    #[serde(default)]
    pub actual_default: Option<bool>,
}

impl OutcomeRecord {
    pub fn is_confirmed(&self) -> bool {
        self.actual_default.is_some()
    }
}

/// Hyper-parameters for a training run.
#[derive(Debug, Clone, PartialEq)]
pub struct TrainParams {
    /// Inverse L2 regularization strength.
    pub c: f64,
    pub max_iter: usize,
    /// Stop once the largest gradient component falls below this.
    pub tol: f64,
    pub cardinality_threshold: usize,
}

impl Default for TrainParams {
    fn default() -> Self {
        Self {
            c: 0.5,
            max_iter: 1000,
            tol: 1e-4,
            cardinality_threshold: DEFAULT_CARDINALITY_THRESHOLD,
        }
    }
}
