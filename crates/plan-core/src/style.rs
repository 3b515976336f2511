/// Architectural style selection offered by the dashboard.
///
/// The set is closed; anything the caller sends that is not listed here
/// (for example "contemporary" or "colonial") falls back to [`Style::Modern`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Style {
    #[default]
    Modern,
    Traditional,
    Minimal,
    Luxury,
}

impl Style {
    /// Parses a style name, falling back to `Modern` for unknown values.
    pub fn from_name(name: &str) -> Self {
        match name.trim().to_ascii_lowercase().as_str() {
            "traditional" => Style::Traditional,
            "minimal" => Style::Minimal,
            "luxury" => Style::Luxury,
            _ => Style::Modern,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Style::Modern => "modern",
            Style::Traditional => "traditional",
            Style::Minimal => "minimal",
            Style::Luxury => "luxury",
        }
    }

    /// Ordered room palette for this style; room `i` takes color `i`.
    pub fn palette(self) -> [&'static str; 4] {
        match self {
            Style::Modern => ["#3b82f6", "#8b5cf6", "#06b6d4", "#10b981"],
            Style::Traditional => ["#d97706", "#dc2626", "#059669", "#7c3aed"],
            Style::Minimal => ["#64748b", "#475569", "#334155", "#1e293b"],
            Style::Luxury => ["#fbbf24", "#f59e0b", "#d97706", "#b45309"],
        }
    }
}
