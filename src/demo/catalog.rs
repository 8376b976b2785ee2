//! Seed data for the demo backend

use crate::catalog::{Category, Component, UseCase};
use std::collections::BTreeMap;

/// A catalog entry plus the data the demo needs to answer for it
#[derive(Debug, Clone)]
pub struct Listing {
    pub component: Component,
    /// Reference price; shop offers are spread around it
    pub base_price: f64,
    pub usecases: Vec<UseCase>,
}

impl Listing {
    pub fn fits(&self, usecase: UseCase) -> bool {
        usecase == UseCase::All || self.usecases.contains(&usecase)
    }
}

fn part(
    id: &str,
    name: &str,
    category: Category,
    brand: &str,
    base_price: f64,
    usecases: &[UseCase],
    specs: &[(&str, &str)],
) -> Listing {
    Listing {
        component: Component {
            id: id.to_string(),
            name: name.to_string(),
            category,
            brand: brand.to_string(),
            specs: specs
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect::<BTreeMap<_, _>>(),
        },
        base_price,
        usecases: usecases.to_vec(),
    }
}

#[rustfmt::skip]
pub fn seed_listings() -> Vec<Listing> {
    use Category::*;
    use UseCase::*;

    vec![
        // CPUs
        part("cpu-1", "AMD Ryzen 9 7950X", Cpu, "AMD", 549.0,
            &[Gaming, Streamer, Video, Cad, Dev, Enthusiast],
            &[("socket", "AM5"), ("cores", "16"), ("tdp_w", "170")]),
        part("cpu-2", "Intel Core i9-13900K", Cpu, "Intel", 529.0,
            &[Gaming, Streamer, Video, Cad, Enthusiast],
            &[("socket", "LGA1700"), ("cores", "24"), ("tdp_w", "125")]),
        part("cpu-3", "AMD Ryzen 5 7600", Cpu, "AMD", 199.0,
            &[Office, Htpc, Gaming, Dev, Nas],
            &[("socket", "AM5"), ("cores", "6"), ("tdp_w", "65")]),
        part("cpu-4", "Intel Core i5-12400", Cpu, "Intel", 149.0,
            &[Office, Htpc, Design, Nas],
            &[("socket", "LGA1700"), ("cores", "6"), ("tdp_w", "65")]),
        // GPUs
        part("gpu-1", "NVIDIA GeForce RTX 4090", Gpu, "NVIDIA", 1599.0,
            &[Gaming, Video, Cad, Enthusiast],
            &[("memory_gb", "24"), ("tdp_w", "450"), ("length_mm", "336")]),
        part("gpu-2", "AMD Radeon RX 7800 XT", Gpu, "AMD", 499.0,
            &[Gaming, Streamer, Design],
            &[("memory_gb", "16"), ("tdp_w", "263"), ("length_mm", "267")]),
        part("gpu-3", "NVIDIA GeForce RTX 4060", Gpu, "NVIDIA", 299.0,
            &[Office, Htpc, Design, Dev],
            &[("memory_gb", "8"), ("tdp_w", "115"), ("length_mm", "200")]),
        // Motherboards
        part("mb-1", "ASUS ROG STRIX B650E-F", Motherboard, "ASUS", 279.0,
            &[Gaming, Streamer, Video, Enthusiast, Dev],
            &[("socket", "AM5"), ("ram_type", "DDR5"), ("form_factor", "ATX"), ("chipset", "B650E")]),
        part("mb-2", "MSI MAG B760M Mortar", Motherboard, "MSI", 189.0,
            &[Office, Gaming, Design, Cad],
            &[("socket", "LGA1700"), ("ram_type", "DDR5"), ("form_factor", "mATX"), ("chipset", "B760")]),
        part("mb-3", "Gigabyte B660I Aorus Pro", Motherboard, "Gigabyte", 169.0,
            &[Htpc, Nas, Office],
            &[("socket", "LGA1700"), ("ram_type", "DDR4"), ("form_factor", "ITX"), ("chipset", "B660")]),
        part("mb-4", "ASRock A620M-HDV", Motherboard, "ASRock", 99.0,
            &[Office, Htpc, Nas],
            &[("socket", "AM5"), ("ram_type", "DDR5"), ("form_factor", "mATX"), ("chipset", "A620")]),
        // Memory
        part("ram-1", "Kingston Fury Beast 32GB DDR5-6000", Ram, "Kingston", 109.0,
            &[Gaming, Streamer, Video, Cad, Dev, Enthusiast],
            &[("ram_type", "DDR5"), ("capacity_gb", "32"), ("speed_mhz", "6000")]),
        part("ram-2", "Corsair Vengeance 16GB DDR4-3200", Ram, "Corsair", 45.0,
            &[Office, Htpc, Nas],
            &[("ram_type", "DDR4"), ("capacity_gb", "16"), ("speed_mhz", "3200")]),
        part("ram-3", "G.Skill Trident Z5 64GB DDR5-6400", Ram, "G.Skill", 229.0,
            &[Video, Cad, Enthusiast],
            &[("ram_type", "DDR5"), ("capacity_gb", "64"), ("speed_mhz", "6400")]),
        // Storage
        part("hdd-1", "Seagate IronWolf 8TB", Hdd, "Seagate", 189.0,
            &[Nas, Video],
            &[("capacity_tb", "8"), ("rpm", "7200")]),
        part("hdd-2", "WD Blue 2TB", Hdd, "WD", 59.0,
            &[Office, Htpc],
            &[("capacity_tb", "2"), ("rpm", "5400")]),
        part("ssd-1", "Samsung 990 Pro 2TB", Ssd, "Samsung", 169.0,
            &[Gaming, Streamer, Video, Cad, Dev, Enthusiast],
            &[("capacity_tb", "2"), ("interface", "NVMe PCIe 4.0")]),
        part("ssd-2", "Crucial MX500 1TB", Ssd, "Crucial", 69.0,
            &[Office, Htpc, Nas, Design],
            &[("capacity_tb", "1"), ("interface", "SATA")]),
        // Cooling
        part("cooler-1", "Noctua NH-D15", Cooler, "Noctua", 109.0,
            &[Gaming, Video, Cad, Enthusiast],
            &[("sockets", "AM5, AM4, LGA1700"), ("height_mm", "165")]),
        part("cooler-2", "be quiet! Pure Rock 2", Cooler, "be quiet!", 39.0,
            &[Office, Htpc, Design, Dev, Nas],
            &[("sockets", "AM4, LGA1200"), ("height_mm", "155")]),
        part("cooler-3", "Arctic Liquid Freezer II 280", Cooler, "Arctic", 119.0,
            &[Gaming, Streamer, Enthusiast],
            &[("sockets", "AM5, LGA1700"), ("height_mm", "38")]),
        // Cases
        part("case-1", "Fractal Design North", Case, "Fractal Design", 139.0,
            &[Gaming, Streamer, Design, Dev, Enthusiast],
            &[("form_factors", "ATX, mATX, ITX"), ("max_gpu_length_mm", "355")]),
        part("case-2", "Cooler Master NR200P", Case, "Cooler Master", 99.0,
            &[Htpc, Nas],
            &[("form_factors", "ITX"), ("max_gpu_length_mm", "330")]),
        part("case-3", "Lian Li Lancool 216", Case, "Lian Li", 99.0,
            &[Office, Gaming, Video, Cad],
            &[("form_factors", "ATX, mATX"), ("max_gpu_length_mm", "392")]),
        // Power
        part("psu-1", "Corsair RM1000x", Psu, "Corsair", 189.0,
            &[Gaming, Video, Cad, Enthusiast],
            &[("power_w", "1000"), ("efficiency", "80+ Gold")]),
        part("psu-2", "Seasonic Focus GX-650", Psu, "Seasonic", 99.0,
            &[Office, Htpc, Streamer, Design, Dev],
            &[("power_w", "650"), ("efficiency", "80+ Gold")]),
        part("psu-3", "be quiet! Pure Power 12 450W", Psu, "be quiet!", 69.0,
            &[Office, Htpc, Nas],
            &[("power_w", "450"), ("efficiency", "80+ Gold")]),
    ]
}

/// Use-case descriptions served by `/config/usecases`
pub fn usecase_descriptions() -> Vec<(UseCase, &'static str)> {
    vec![
        (UseCase::Office, "Documents, browsing, video calls"),
        (UseCase::Htpc, "Quiet living-room media machine"),
        (UseCase::Gaming, "High frame rates at 1440p"),
        (UseCase::Streamer, "Game and encode at the same time"),
        (UseCase::Design, "Photo editing and illustration"),
        (UseCase::Video, "4K timelines and color grading"),
        (UseCase::Cad, "Modeling and rendering"),
        (UseCase::Dev, "Compiles, containers, many tabs"),
        (UseCase::Enthusiast, "No compromises"),
        (UseCase::Nas, "Always-on storage at low power"),
    ]
}

/// Shops quoted by the demo
pub const SHOPS: [&str; 3] = ["DNS", "Citilink", "Regard"];

/// Demo account available out of the box
pub const DEMO_EMAIL: &str = "demo@uconf.dev";
pub const DEMO_PASSWORD: &str = "demodemo";
pub const DEMO_NAME: &str = "Demo User";
