use std::fmt;
use std::str::FromStr;

use thiserror::Error;

/// Barcode symbologies the engine can locate and decode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Symbology {
    /// QR Code, Model 2
    QrCode,
    /// Code 128 (sets A, B and C)
    Code128,
    /// Code 39, standard 43-character alphabet
    Code39,
    /// EAN-13
    Ean13,
    /// EAN-8
    Ean8,
    /// UPC-A (an EAN-13 with a leading zero)
    UpcA,
    /// Interleaved 2 of 5
    Itf,
}

impl Symbology {
    /// Every supported symbology.
    pub const ALL: [Symbology; 7] = [
        Symbology::QrCode,
        Symbology::Code128,
        Symbology::Code39,
        Symbology::Ean13,
        Symbology::Ean8,
        Symbology::UpcA,
        Symbology::Itf,
    ];

    /// Every linear (1D) symbology.
    pub const LINEAR: [Symbology; 6] = [
        Symbology::Code128,
        Symbology::Code39,
        Symbology::Ean13,
        Symbology::Ean8,
        Symbology::UpcA,
        Symbology::Itf,
    ];

    /// True for 1D symbologies.
    pub fn is_linear(self) -> bool {
        !matches!(self, Symbology::QrCode)
    }

    /// Canonical lower-case name, also accepted by [`FromStr`].
    pub fn name(self) -> &'static str {
        match self {
            Symbology::QrCode => "qr",
            Symbology::Code128 => "code128",
            Symbology::Code39 => "code39",
            Symbology::Ean13 => "ean13",
            Symbology::Ean8 => "ean8",
            Symbology::UpcA => "upca",
            Symbology::Itf => "itf",
        }
    }

    fn bit(self) -> u16 {
        1 << (self as u16)
    }
}

impl fmt::Display for Symbology {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Symbology::QrCode => "QR Code",
            Symbology::Code128 => "Code 128",
            Symbology::Code39 => "Code 39",
            Symbology::Ean13 => "EAN-13",
            Symbology::Ean8 => "EAN-8",
            Symbology::UpcA => "UPC-A",
            Symbology::Itf => "ITF",
        };
        f.write_str(label)
    }
}

/// Returned when a symbology name is not recognised.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown symbology `{0}`")]
pub struct ParseSymbologyError(pub String);

impl FromStr for Symbology {
    type Err = ParseSymbologyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized: String = s
            .chars()
            .filter(|c| c.is_ascii_alphanumeric())
            .map(|c| c.to_ascii_lowercase())
            .collect();
        match normalized.as_str() {
            "qr" | "qrcode" => Ok(Symbology::QrCode),
            "code128" => Ok(Symbology::Code128),
            "code39" => Ok(Symbology::Code39),
            "ean13" => Ok(Symbology::Ean13),
            "ean8" => Ok(Symbology::Ean8),
            "upca" => Ok(Symbology::UpcA),
            "itf" | "interleaved2of5" => Ok(Symbology::Itf),
            _ => Err(ParseSymbologyError(s.to_string())),
        }
    }
}

/// Allow-list of symbologies.
///
/// An empty set means "all 1D" when handed to the decoder, see
/// [`SymbologySet::or_default`].
#[derive(Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct SymbologySet(u16);

impl SymbologySet {
    /// The empty set.
    pub const fn empty() -> Self {
        Self(0)
    }

    /// Every supported symbology.
    pub fn all() -> Self {
        Symbology::ALL.into_iter().collect()
    }

    /// Every 1D symbology.
    pub fn all_linear() -> Self {
        Symbology::LINEAR.into_iter().collect()
    }

    /// A set holding exactly one symbology.
    pub fn only(symbology: Symbology) -> Self {
        Self(symbology.bit())
    }

    /// Builder-style insert.
    pub fn with(mut self, symbology: Symbology) -> Self {
        self.insert(symbology);
        self
    }

    /// Add a symbology.
    pub fn insert(&mut self, symbology: Symbology) {
        self.0 |= symbology.bit();
    }

    /// Membership test.
    pub fn contains(&self, symbology: Symbology) -> bool {
        self.0 & symbology.bit() != 0
    }

    /// True when no symbology is selected.
    pub fn is_empty(&self) -> bool {
        self.0 == 0
    }

    /// True when at least one 1D symbology is selected.
    pub fn has_linear(&self) -> bool {
        Symbology::LINEAR.iter().any(|s| self.contains(*s))
    }

    /// Resolves the empty set to all 1D symbologies.
    pub fn or_default(self) -> Self {
        if self.is_empty() {
            Self::all_linear()
        } else {
            self
        }
    }

    /// Members in declaration order.
    pub fn iter(&self) -> impl Iterator<Item = Symbology> + '_ {
        Symbology::ALL.into_iter().filter(|s| self.contains(*s))
    }
}

impl FromIterator<Symbology> for SymbologySet {
    fn from_iter<I: IntoIterator<Item = Symbology>>(iter: I) -> Self {
        let mut set = Self::empty();
        for symbology in iter {
            set.insert(symbology);
        }
        set
    }
}

impl fmt::Debug for SymbologySet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_set().entries(self.iter()).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_names() {
        assert_eq!("QR".parse::<Symbology>(), Ok(Symbology::QrCode));
        assert_eq!("Code-128".parse::<Symbology>(), Ok(Symbology::Code128));
        assert_eq!("upc_a".parse::<Symbology>(), Ok(Symbology::UpcA));
        assert!("pdf417".parse::<Symbology>().is_err());
        for s in Symbology::ALL {
            assert_eq!(s.name().parse::<Symbology>(), Ok(s));
        }
    }

    #[test]
    fn test_empty_set_defaults_to_linear() {
        let set = SymbologySet::empty().or_default();
        assert!(set.contains(Symbology::Code128));
        assert!(set.contains(Symbology::Itf));
        assert!(!set.contains(Symbology::QrCode));
        assert_eq!(set.iter().count(), Symbology::LINEAR.len());
    }

    #[test]
    fn test_set_membership() {
        let set = SymbologySet::only(Symbology::QrCode).with(Symbology::Ean8);
        assert!(set.contains(Symbology::QrCode));
        assert!(set.contains(Symbology::Ean8));
        assert!(!set.contains(Symbology::Ean13));
        assert!(set.has_linear());
        assert!(!SymbologySet::only(Symbology::QrCode).has_linear());
        assert_eq!(set.or_default(), set);
    }
}
