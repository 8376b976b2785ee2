//! Hardware categories - the slots of a PC build
//!
//! The set is closed and known at build time. Display order matches the
//! configurator tab bar.

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

/// A slot in a PC build
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Category {
    #[default]
    Cpu,
    Gpu,
    Motherboard,
    Ram,
    Hdd,
    Ssd,
    Cooler,
    Case,
    Psu,
}

impl Category {
    /// All categories in tab order
    pub const ALL: [Category; 9] = [
        Category::Cpu,
        Category::Gpu,
        Category::Motherboard,
        Category::Ram,
        Category::Hdd,
        Category::Ssd,
        Category::Cooler,
        Category::Case,
        Category::Psu,
    ];

    /// Wire name used by the backend
    pub fn as_str(&self) -> &'static str {
        match self {
            Category::Cpu => "cpu",
            Category::Gpu => "gpu",
            Category::Motherboard => "motherboard",
            Category::Ram => "ram",
            Category::Hdd => "hdd",
            Category::Ssd => "ssd",
            Category::Cooler => "cooler",
            Category::Case => "case",
            Category::Psu => "psu",
        }
    }

    /// Human-readable label for tabs and the build summary
    pub fn label(&self) -> &'static str {
        match self {
            Category::Cpu => "Processor",
            Category::Gpu => "Graphics card",
            Category::Motherboard => "Motherboard",
            Category::Ram => "Memory",
            Category::Hdd => "Hard drive",
            Category::Ssd => "SSD",
            Category::Cooler => "Cooler",
            Category::Case => "Case",
            Category::Psu => "Power supply",
        }
    }

    /// Short label for narrow tab bars
    pub fn short_label(&self) -> &'static str {
        match self {
            Category::Cpu => "CPU",
            Category::Gpu => "GPU",
            Category::Motherboard => "MB",
            Category::Ram => "RAM",
            Category::Hdd => "HDD",
            Category::Ssd => "SSD",
            Category::Cooler => "Cool",
            Category::Case => "Case",
            Category::Psu => "PSU",
        }
    }

    /// Spec attribute submitted as the compatibility key when a component of
    /// this category is a base of a compatibility query.
    ///
    /// `None` means the component's display name is the key. Only CPU is
    /// matched by attribute (its socket).
    pub fn compatibility_key_spec(&self) -> Option<&'static str> {
        match self {
            Category::Cpu => Some("socket"),
            _ => None,
        }
    }

    /// Next category in tab order (wraps around)
    pub fn next(self) -> Self {
        let idx = self.index();
        Self::ALL[(idx + 1) % Self::ALL.len()]
    }

    /// Previous category in tab order (wraps around)
    pub fn prev(self) -> Self {
        let idx = self.index();
        Self::ALL[(idx + Self::ALL.len() - 1) % Self::ALL.len()]
    }

    /// Position in tab order
    pub fn index(&self) -> usize {
        Self::ALL
            .iter()
            .position(|c| c == self)
            .unwrap_or_default()
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error for names outside the closed category set
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown category '{0}' (expected one of: cpu, gpu, motherboard, ram, hdd, ssd, cooler, case, psu)")]
pub struct UnknownCategory(pub String);

impl FromStr for Category {
    type Err = UnknownCategory;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "cpu" => Ok(Category::Cpu),
            "gpu" => Ok(Category::Gpu),
            "motherboard" => Ok(Category::Motherboard),
            "ram" => Ok(Category::Ram),
            "hdd" => Ok(Category::Hdd),
            "ssd" => Ok(Category::Ssd),
            // The catalog service names coolers "cpu_cooler"
            "cooler" | "cpu_cooler" => Ok(Category::Cooler),
            "case" => Ok(Category::Case),
            "psu" | "power_supply" => Ok(Category::Psu),
            _ => Err(UnknownCategory(s.to_string())),
        }
    }
}

impl Serialize for Category {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for Category {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn first_tab_is_the_default() {
        assert_eq!(Category::default(), Category::Cpu);
        assert_eq!(Category::default(), Category::ALL[0]);
    }

    #[test]
    fn parses_wire_names_and_aliases() {
        assert_eq!("cpu".parse::<Category>().unwrap(), Category::Cpu);
        assert_eq!("CPU".parse::<Category>().unwrap(), Category::Cpu);
        assert_eq!("cpu_cooler".parse::<Category>().unwrap(), Category::Cooler);
        assert_eq!("power_supply".parse::<Category>().unwrap(), Category::Psu);
        assert!("soundcard".parse::<Category>().is_err());
    }

    #[test]
    fn tab_cycling_wraps() {
        assert_eq!(Category::Cpu.next(), Category::Gpu);
        assert_eq!(Category::Psu.next(), Category::Cpu);
        assert_eq!(Category::Cpu.prev(), Category::Psu);
        for c in Category::ALL {
            assert_eq!(c.next().prev(), c);
        }
    }

    #[test]
    fn only_cpu_declares_attribute_key() {
        assert_eq!(Category::Cpu.compatibility_key_spec(), Some("socket"));
        for c in Category::ALL.iter().filter(|c| **c != Category::Cpu) {
            assert_eq!(c.compatibility_key_spec(), None, "{c}");
        }
    }

    #[test]
    fn serde_uses_wire_names() {
        let json = serde_json::to_string(&Category::Motherboard).unwrap();
        assert_eq!(json, "\"motherboard\"");
        let back: Category = serde_json::from_str("\"cpu_cooler\"").unwrap();
        assert_eq!(back, Category::Cooler);
    }
}
