//! Entity shapes for projects and their aggregates.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// Fixed-point decimal with exactly two fractional digits, stored as hundredths
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct Decimal(i64);

impl Decimal {
    /// Largest magnitude a `DECIMAL(7,2)` column holds
    pub const COLUMN_MAX: Decimal = Decimal(9_999_999);

    /// Build from a count of hundredths (`1250` is `12.50`)
    #[cfg(test)]
    pub const fn from_hundredths(hundredths: i64) -> Self {
        Decimal(hundredths)
    }

    /// Round a float to the nearest hundredth. Non-finite or out of range values yield `None`.
    pub fn from_f64(value: f64) -> Option<Self> {
        let scaled = (value * 100.0).round();
        if !scaled.is_finite() || scaled.abs() >= i64::MAX as f64 {
            return None;
        }
        Some(Decimal(scaled as i64))
    }

    pub fn from_integer(value: i64) -> Option<Self> {
        value.checked_mul(100).map(Decimal)
    }

    /// Whether the value is stored exactly by a `DECIMAL(7,2)` column
    pub fn fits_column(self) -> bool {
        self.0.unsigned_abs() <= Self::COLUMN_MAX.0.unsigned_abs()
    }
}

/// Error produced when text cannot be read as a decimal number
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("'{0}' is not a valid decimal number")]
pub struct ParseDecimalError(String);

impl FromStr for Decimal {
    type Err = ParseDecimalError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || ParseDecimalError(s.to_string());
        let text = s.trim();
        let (negative, digits) = match text.strip_prefix('-') {
            Some(rest) => (true, rest),
            None => (false, text.strip_prefix('+').unwrap_or(text)),
        };
        let (whole, fraction) = digits.split_once('.').unwrap_or((digits, ""));
        if whole.is_empty() && fraction.is_empty() {
            return Err(invalid());
        }
        if !whole.bytes().all(|b| b.is_ascii_digit()) || !fraction.bytes().all(|b| b.is_ascii_digit()) {
            return Err(invalid());
        }

        let whole: i64 = if whole.is_empty() {
            0
        } else {
            whole.parse().map_err(|_| invalid())?
        };
        let mut fraction_digits = fraction.bytes().map(|b| i64::from(b - b'0'));
        let tenths = fraction_digits.next().unwrap_or(0);
        let hundredths = fraction_digits.next().unwrap_or(0);
        // Half away from zero on the third fractional digit
        let round_up = fraction_digits.next().map(|d| d >= 5).unwrap_or(false);

        let magnitude = whole
            .checked_mul(100)
            .and_then(|v| v.checked_add(tenths * 10 + hundredths + i64::from(round_up)))
            .ok_or_else(invalid)?;
        Ok(Decimal(if negative { -magnitude } else { magnitude }))
    }
}

impl fmt::Display for Decimal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let sign = if self.0 < 0 { "-" } else { "" };
        let magnitude = self.0.unsigned_abs();
        write!(f, "{sign}{}.{:02}", magnitude / 100, magnitude % 100)
    }
}

impl Serialize for Decimal {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for Decimal {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let text = String::deserialize(deserializer)?;
        text.parse().map_err(serde::de::Error::custom)
    }
}

/// A tracked project. Aggregates are only populated when fetched by id.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Project {
    pub project_id: Option<i64>,
    pub project_name: String,
    pub estimated_hours: Option<Decimal>,
    pub actual_hours: Option<Decimal>,
    /// Expected 1-5, not enforced here
    pub difficulty: Option<i32>,
    pub notes: Option<String>,
    pub materials: Vec<Material>,
    pub steps: Vec<Step>,
    pub categories: Vec<Category>,
}

impl Project {
    pub fn new(project_name: impl Into<String>) -> Self {
        Project {
            project_name: project_name.into(),
            ..Default::default()
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Material {
    pub material_id: Option<i64>,
    pub project_id: Option<i64>,
    pub material_name: String,
    pub num_required: Option<i32>,
    pub cost: Option<Decimal>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Step {
    pub step_id: Option<i64>,
    pub project_id: Option<i64>,
    pub step_text: String,
    pub step_order: i32,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Category {
    pub category_id: Option<i64>,
    pub category_name: String,
}

fn or_blank<T: fmt::Display>(value: &Option<T>) -> String {
    value.as_ref().map(ToString::to_string).unwrap_or_default()
}

impl fmt::Display for Project {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f)?;
        writeln!(f, "   ID={}", or_blank(&self.project_id))?;
        writeln!(f, "   name={}", self.project_name)?;
        writeln!(f, "   estimatedHours={}", or_blank(&self.estimated_hours))?;
        writeln!(f, "   actualHours={}", or_blank(&self.actual_hours))?;
        writeln!(f, "   difficulty={}", or_blank(&self.difficulty))?;
        writeln!(f, "   notes={}", or_blank(&self.notes))?;

        writeln!(f, "   Materials:")?;
        for material in &self.materials {
            writeln!(f, "      {material}")?;
        }
        writeln!(f, "   Steps:")?;
        for step in &self.steps {
            writeln!(f, "      {step}")?;
        }
        writeln!(f, "   Categories:")?;
        for category in &self.categories {
            writeln!(f, "      {category}")?;
        }
        Ok(())
    }
}

impl fmt::Display for Material {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "ID={}, name={}, numRequired={}, cost={}",
            or_blank(&self.material_id),
            self.material_name,
            or_blank(&self.num_required),
            or_blank(&self.cost)
        )
    }
}

impl fmt::Display for Step {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "ID={}, order={}, text={}",
            or_blank(&self.step_id),
            self.step_order,
            self.step_text
        )
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ID={}, name={}", or_blank(&self.category_id), self.category_name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decimal_normalizes_to_two_digits() {
        assert_eq!("12.5".parse::<Decimal>().unwrap().to_string(), "12.50");
        assert_eq!("12.500".parse::<Decimal>().unwrap().to_string(), "12.50");
        assert_eq!("7".parse::<Decimal>().unwrap().to_string(), "7.00");
        assert_eq!(".5".parse::<Decimal>().unwrap().to_string(), "0.50");
        assert_eq!("-3.1".parse::<Decimal>().unwrap().to_string(), "-3.10");
    }

    #[test]
    fn test_decimal_rounds_half_away_from_zero() {
        assert_eq!("0.125".parse::<Decimal>().unwrap(), Decimal::from_hundredths(13));
        assert_eq!("0.124".parse::<Decimal>().unwrap(), Decimal::from_hundredths(12));
        assert_eq!("-0.125".parse::<Decimal>().unwrap(), Decimal::from_hundredths(-13));
    }

    #[test]
    fn test_decimal_rejects_garbage() {
        assert!("".parse::<Decimal>().is_err());
        assert!(".".parse::<Decimal>().is_err());
        assert!("1.2.3".parse::<Decimal>().is_err());
        assert!("abc".parse::<Decimal>().is_err());
        assert!("1e3".parse::<Decimal>().is_err());
    }

    #[test]
    fn test_decimal_column_bounds() {
        assert!("99999.99".parse::<Decimal>().unwrap().fits_column());
        assert!("-99999.99".parse::<Decimal>().unwrap().fits_column());
        assert!(!"100000".parse::<Decimal>().unwrap().fits_column());
        assert!(!"-100000.00".parse::<Decimal>().unwrap().fits_column());
    }

    #[test]
    fn test_decimal_from_f64() {
        assert_eq!(Decimal::from_f64(12.5), Some(Decimal::from_hundredths(1250)));
        assert_eq!(Decimal::from_f64(0.1 + 0.2), Some(Decimal::from_hundredths(30)));
        assert_eq!(Decimal::from_f64(f64::NAN), None);
    }

    #[test]
    fn test_decimal_serializes_as_string() {
        let json = serde_json::to_string(&Decimal::from_hundredths(1250)).unwrap();
        assert_eq!(json, "\"12.50\"");
        let back: Decimal = serde_json::from_str("\"4.2\"").unwrap();
        assert_eq!(back, Decimal::from_hundredths(420));
    }

    #[test]
    fn test_project_display_lists_aggregates() {
        let mut project = Project::new("Shelf");
        project.project_id = Some(3);
        project.steps.push(Step {
            step_id: Some(1),
            project_id: Some(3),
            step_text: "Cut boards".to_string(),
            step_order: 1,
        });
        let text = project.to_string();
        assert!(text.contains("ID=3"));
        assert!(text.contains("name=Shelf"));
        assert!(text.contains("order=1, text=Cut boards"));
    }
}
