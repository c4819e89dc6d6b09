use rand::Rng;

const ADJECTIVES: [&str; 5] = ["anonymous", "cute", "cool", "brave", "quiet"];
const ANIMALS: [&str; 7] = [
    "rabbit", "cat", "puppy", "deer", "raccoon", "bear", "squirrel",
];

/// Throwaway display name for a freshly connected peer.
pub fn generate() -> String {
    let mut rng = rand::thread_rng();
    let adjective = ADJECTIVES[rng.gen_range(0..ADJECTIVES.len())];
    let animal = ANIMALS[rng.gen_range(0..ANIMALS.len())];
    format!("{} {}", adjective, animal)
}
