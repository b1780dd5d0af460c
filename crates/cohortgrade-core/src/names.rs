//! Random display names for enrollments that did not pick one.

use uuid::Uuid;

use crate::model::Enrollment;

const ADJECTIVES: &[&str] = &[
    "Agile", "Bold", "Brave", "Bright", "Calm", "Clever", "Curious", "Daring", "Eager", "Fierce",
    "Gentle", "Happy", "Jolly", "Keen", "Lively", "Lucky", "Mighty", "Nimble", "Patient", "Quick",
    "Quiet", "Sharp", "Steady", "Swift", "Witty", "Zesty",
];

const ANIMALS: &[&str] = &[
    "Badger", "Beaver", "Falcon", "Ferret", "Fox", "Gecko", "Heron", "Ibis", "Jaguar", "Koala",
    "Lemur", "Lynx", "Marmot", "Narwhal", "Otter", "Owl", "Panda", "Puffin", "Quokka", "Raven",
    "Seal", "Tapir", "Walrus", "Wombat", "Yak", "Zebra",
];

/// Pick an "Adjective Animal" pair from `seed`.
pub fn display_name_from_seed(seed: u128) -> String {
    let low = seed as u64;
    let high = (seed >> 64) as u64;
    let adjective = ADJECTIVES[(low % ADJECTIVES.len() as u64) as usize];
    let animal = ANIMALS[(high % ANIMALS.len() as u64) as usize];
    format!("{adjective} {animal}")
}

/// A fresh random display name.
pub fn generate_display_name() -> String {
    display_name_from_seed(Uuid::new_v4().as_u128())
}

/// Fill in a display name when the enrollment has none (or a blank one).
///
/// Returns `true` if a name was generated.
pub fn ensure_display_name(enrollment: &mut Enrollment) -> bool {
    let missing = enrollment
        .display_name
        .as_deref()
        .map_or(true, |name| name.trim().is_empty());
    if missing {
        enrollment.display_name = Some(generate_display_name());
    }
    missing
}
