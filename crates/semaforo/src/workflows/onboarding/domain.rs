use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;

/// The fixed catalogue of products tracked during onboarding.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Product {
    F2025,
    F2026,
    Hl,
    Vigilancia,
    Implant,
    Denuncias,
}

impl Product {
    pub const COUNT: usize = 6;

    pub const fn ordered() -> [Self; Self::COUNT] {
        [
            Self::F2025,
            Self::F2026,
            Self::Hl,
            Self::Vigilancia,
            Self::Implant,
            Self::Denuncias,
        ]
    }

    pub const fn code(self) -> &'static str {
        match self {
            Self::F2025 => "F2025",
            Self::F2026 => "F2026",
            Self::Hl => "HL",
            Self::Vigilancia => "VIGILANCIA",
            Self::Implant => "IMPLANT",
            Self::Denuncias => "DENUNCIAS",
        }
    }

    pub fn from_code(raw: &str) -> Option<Self> {
        let trimmed = raw.trim();
        Self::ordered()
            .into_iter()
            .find(|product| product.code().eq_ignore_ascii_case(trimmed))
    }

    const fn index(self) -> usize {
        self as usize
    }
}

impl fmt::Display for Product {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

/// Marked/unmarked flag for each product, one slot per [`Product`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProductMarks([bool; Product::COUNT]);

impl ProductMarks {
    pub const fn all_marked() -> Self {
        Self([true; Product::COUNT])
    }

    pub fn is_marked(&self, product: Product) -> bool {
        self.0[product.index()]
    }

    pub fn set(&mut self, product: Product, marked: bool) {
        self.0[product.index()] = marked;
    }

    /// Flips the mark and returns the new value.
    pub fn toggle(&mut self, product: Product) -> bool {
        let slot = &mut self.0[product.index()];
        *slot = !*slot;
        *slot
    }

    /// "Checks": products marked on this row.
    pub fn marked_count(&self) -> usize {
        self.0.iter().filter(|marked| **marked).count()
    }

    /// "Crosses": products still unmarked on this row.
    pub fn unmarked_count(&self) -> usize {
        Product::COUNT - self.marked_count()
    }

    pub fn is_complete(&self) -> bool {
        self.marked_count() == Product::COUNT
    }

    pub fn iter(&self) -> impl Iterator<Item = (Product, bool)> + '_ {
        Product::ordered()
            .into_iter()
            .map(move |product| (product, self.is_marked(product)))
    }
}

/// Derived color state of a row.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Semaphore {
    #[default]
    #[serde(rename = "")]
    Pending,
    BlueFinalized,
    Green,
    Yellow,
    Red,
}

impl Semaphore {
    /// Report and filter order for the non-pending states.
    pub const fn ordered() -> [Self; 4] {
        [Self::BlueFinalized, Self::Green, Self::Yellow, Self::Red]
    }

    /// Canonical persisted form. Pending is the empty string.
    pub const fn code(self) -> &'static str {
        match self {
            Self::Pending => "",
            Self::BlueFinalized => "BLUE_FINALIZED",
            Self::Green => "GREEN",
            Self::Yellow => "YELLOW",
            Self::Red => "RED",
        }
    }

    pub const fn label(self) -> &'static str {
        match self {
            Self::Pending => "Pending",
            Self::BlueFinalized => "Blue - Finalized",
            Self::Green => "Green",
            Self::Yellow => "Yellow",
            Self::Red => "Red",
        }
    }

    /// Background and foreground colors used when rendering the state.
    pub const fn colors(self) -> Option<(&'static str, &'static str)> {
        match self {
            Self::Pending => None,
            Self::BlueFinalized => Some(("#0070C0", "#ffffff")),
            Self::Green => Some(("#00FF00", "#000000")),
            Self::Yellow => Some(("#FFFF00", "#000000")),
            Self::Red => Some(("#FF0000", "#ffffff")),
        }
    }

    /// Accepts canonical codes plus the legacy spreadsheet labels.
    pub fn parse(raw: &str) -> Option<Self> {
        let normalized = raw.trim().to_ascii_uppercase();
        match normalized.as_str() {
            "" | "PENDING" => Some(Self::Pending),
            "BLUE_FINALIZED" | "BLUE - FINALIZED" | "AZUL - FINALIZADO" => {
                Some(Self::BlueFinalized)
            }
            "GREEN" | "VERDE" => Some(Self::Green),
            "YELLOW" | "AMARILLO" => Some(Self::Yellow),
            "RED" | "ROJO" => Some(Self::Red),
            _ => None,
        }
    }

    pub fn is_pending(self) -> bool {
        self == Self::Pending
    }
}

impl fmt::Display for Semaphore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// One day of a customer's onboarding window.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CustomerRecord {
    pub call_center_id: String,
    pub sales_agent: String,
    pub customer_name: String,
    pub scheduled_date: NaiveDate,
    pub product_marks: ProductMarks,
    pub status: Semaphore,
}

impl CustomerRecord {
    pub fn new(
        call_center_id: impl Into<String>,
        sales_agent: impl Into<String>,
        customer_name: impl Into<String>,
        scheduled_date: NaiveDate,
    ) -> Self {
        Self {
            call_center_id: call_center_id.into(),
            sales_agent: sales_agent.into(),
            customer_name: customer_name.into(),
            scheduled_date,
            product_marks: ProductMarks::default(),
            status: Semaphore::Pending,
        }
    }

    pub fn is_due(&self, today: NaiveDate) -> bool {
        self.scheduled_date <= today
    }
}

/// Operator-supplied fields for a new customer block.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct NewCustomer {
    #[serde(default)]
    pub call_center_id: Option<String>,
    pub sales_agent: String,
    pub customer_name: String,
}

/// Validation failures. None of these change state.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum OnboardingError {
    #[error("only today's row can be edited for {customer_name} (requested {requested}, today is {today})")]
    NotCurrentDay {
        customer_name: String,
        requested: NaiveDate,
        today: NaiveDate,
    },
    #[error("missing required field: {0}")]
    MissingField(&'static str),
    #[error("customer {0} already has an onboarding block")]
    DuplicateCustomer(String),
    #[error("customer {0} not found")]
    CustomerNotFound(String),
    #[error("customer {customer_name} has no row scheduled on {date}")]
    RowNotFound {
        customer_name: String,
        date: NaiveDate,
    },
    #[error("call center {0} is outside the operator's scope")]
    OutOfScope(String),
}
