use chrono::Utc;

/// Fixed list a missing `expertise_domains` value is drawn from.
pub const LEGAL_DOMAINS: [&str; 6] = [
    "Corporate Law",
    "Criminal Law",
    "Family Law",
    "Commercial Law",
    "Civil Law",
    "Tax Law",
];

const SUFFIX_LEN: usize = 9;
const BASE36: &[u8; 36] = b"0123456789abcdefghijklmnopqrstuvwxyz";

/// Source of every random choice the pipeline makes. Production wires a
/// clock-seeded generator; tests pass a fixed seed or a scripted stub.
pub trait PlaceholderSource {
    fn next_u64(&mut self) -> u64;
}

/// splitmix64: small, seedable and good enough for placeholder text.
#[derive(Debug, Clone)]
pub struct SeededPlaceholders {
    state: u64,
}

impl SeededPlaceholders {
    pub fn new(seed: u64) -> Self {
        Self { state: seed }
    }

    pub fn from_clock() -> Self {
        let now = Utc::now();
        let nanos = now
            .timestamp_nanos_opt()
            .unwrap_or_else(|| now.timestamp_micros().saturating_mul(1_000));
        Self::new(nanos as u64)
    }
}

impl PlaceholderSource for SeededPlaceholders {
    fn next_u64(&mut self) -> u64 {
        self.state = self.state.wrapping_add(0x9E37_79B9_7F4A_7C15);
        let mut z = self.state;
        z = (z ^ (z >> 30)).wrapping_mul(0xBF58_476D_1CE4_E5B9);
        z = (z ^ (z >> 27)).wrapping_mul(0x94D0_49BB_1331_11EB);
        z ^ (z >> 31)
    }
}

/// Nine lowercase base-36 characters.
pub fn base36_suffix(source: &mut dyn PlaceholderSource) -> String {
    let mut value = source.next_u64();
    let mut suffix = String::with_capacity(SUFFIX_LEN);
    for _ in 0..SUFFIX_LEN {
        suffix.push(char::from(BASE36[(value % 36) as usize]));
        value /= 36;
    }
    suffix
}

pub fn placeholder_name(source: &mut dyn PlaceholderSource) -> String {
    format!("Lawyer_{}", base36_suffix(source))
}

pub fn placeholder_id(row_number: usize, source: &mut dyn PlaceholderSource) -> String {
    format!("L{row_number}-{}", base36_suffix(source))
}

pub fn placeholder_domain(source: &mut dyn PlaceholderSource) -> &'static str {
    *pick(&LEGAL_DOMAINS, source)
}

pub fn pick<'a, T>(items: &'a [T], source: &mut dyn PlaceholderSource) -> &'a T {
    let index = (source.next_u64() % items.len() as u64) as usize;
    &items[index]
}

/// Uniform float in `[0, 1)` built from the top 53 bits.
pub fn unit_interval(source: &mut dyn PlaceholderSource) -> f64 {
    (source.next_u64() >> 11) as f64 / (1u64 << 53) as f64
}
