/// The backend-independent comparison vocabulary for field lookups.
///
/// Each backend maps these tokens to its native predicate form; the
/// vocabulary itself carries no backend semantics. There is no negation and
/// no OR — multiple lookups in one filter always AND together.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Comparison {
    Equal,
    Like,
    In,
    Lt,
    Lte,
    Gt,
    Gte,
}

impl Comparison {
    /// Resolves a lookup suffix to its comparison.
    ///
    /// The empty suffix and `"exact"` both mean `Equal`.
    pub fn from_suffix(suffix: &str) -> Option<Self> {
        match suffix {
            "" | "exact" => Some(Comparison::Equal),
            "like" => Some(Comparison::Like),
            "in" => Some(Comparison::In),
            "lt" => Some(Comparison::Lt),
            "lte" => Some(Comparison::Lte),
            "gt" => Some(Comparison::Gt),
            "gte" => Some(Comparison::Gte),
            _ => None,
        }
    }

    /// The canonical lookup suffix for this comparison.
    pub fn suffix(&self) -> &'static str {
        match self {
            Comparison::Equal => "exact",
            Comparison::Like => "like",
            Comparison::In => "in",
            Comparison::Lt => "lt",
            Comparison::Lte => "lte",
            Comparison::Gt => "gt",
            Comparison::Gte => "gte",
        }
    }
}
