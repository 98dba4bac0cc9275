// Beans Engine — Simulated Responder
// The canned Q&A brain behind test mode: substring rules over the
// lower-cased input, checked in a fixed priority order, first match wins.
// Total over all inputs — there is no error path.

use rand::seq::SliceRandom;

// ── Fixed replies ──────────────────────────────────────────────────────

pub const GREETING_REPLY: &str = "I'm doing great, thanks for asking! As Beans AI, I'm always brewing up good conversations. ☕ How about you?";

pub const FINGERS_REPLY: &str = "A human hand typically has 5 fingers! That's one thumb and four fingers. 🖐️";

pub const DOG_REPLY: &str = "No, I'm not a dog! I'm Beans, an AI assistant powered by coffee beans. 🐶☕ Though I do love a good pup-peroni!";

pub const BEST_COFFEE_REPLY: &str = "The best coffee is subjective, but I recommend trying Ethiopian Yirgacheffe or Colombian Supremo! ☕ Freshly roasted and brewed properly makes all the difference. What's your favorite type?";

// ── Reply pools ────────────────────────────────────────────────────────

pub const COFFEE_FACTS: [&str; 4] = [
    "Coffee comes from the Coffea plant, and there are over 120 species! Did you know the most common are Arabica and Robusta? ☕",
    "Great question about coffee! The perfect brewing temperature is around 195-205°F (90-96°C). Too hot and it can taste bitter! ☕",
    "Coffee contains over 1,000 chemical compounds! That's why it has such complex flavors. My favorite is the aroma of freshly ground beans. ☕",
    "Coffee was discovered in Ethiopia around the 9th century. Legend says a goat herder noticed his goats getting energetic after eating red berries! ☕",
];

pub const COFFEE_JOKES: [&str; 4] = [
    "Why did the coffee file a police report? It got mugged! ☕😄",
    "What do you call a sad cup of coffee? Depresso! ☕😢",
    "Why don't skeletons drink coffee? Because it goes right through them! ☕💀",
    "How does a coffee bean greet its friends? 'Hey, brew-can!' ☕👋",
];

/// All five acknowledgement templates instantiated for `input`.
/// Each interpolates the verbatim (non-lower-cased) user text.
pub fn fallback_replies(input: &str) -> [String; 5] {
    [
        format!("Thanks for asking about '{input}'! As Beans AI, I'm here to help with coffee-fueled insights. ☕"),
        format!("That's an interesting question: '{input}'. Let me brew up some thoughts on that..."),
        format!("Regarding '{input}' - I'm Beans, your AI assistant powered by beans! Here's what I think..."),
        format!("I love questions like '{input}'! As an AI who runs on coffee, I'd suggest..."),
        format!("About '{input}' - remember, good conversations are like good coffee: warm and energizing! Here's my take..."),
    ]
}

// ── Rule dispatch ──────────────────────────────────────────────────────

/// Pick a reply for `input`. Rule order is load-bearing: several inputs
/// match more than one rule, and the first hit wins.
pub fn simulated_reply(input: &str) -> String {
    let lower = input.to_lowercase();

    if lower.contains("how are you") || lower.contains("how do you do") {
        GREETING_REPLY.to_string()
    } else if lower.contains("finger") && (lower.contains("how many") || lower.contains("count")) {
        FINGERS_REPLY.to_string()
    } else if lower.contains("dog") && (lower.contains("are you") || lower.contains("you a")) {
        DOG_REPLY.to_string()
    } else if lower.contains("best coffee")
        || (lower.contains("what") && lower.contains("coffee") && lower.contains("best"))
    {
        BEST_COFFEE_REPLY.to_string()
    } else if lower.contains("coffee")
        && (lower.contains("like") || lower.contains("know about") || lower.contains("tell me"))
    {
        pick(&COFFEE_FACTS)
    } else if lower.contains("time") || lower.contains("date") {
        let now = chrono::Local::now().format("%Y-%m-%d %H:%M:%S");
        format!("Current time is {now}. Time flies when you're having fun conversations! ⏰")
    } else if lower.contains("joke") {
        pick(&COFFEE_JOKES)
    } else {
        let replies = fallback_replies(input);
        replies
            .choose(&mut rand::thread_rng())
            .cloned()
            .unwrap_or_else(|| replies[0].clone())
    }
}

/// Uniform pick from a fixed pool.
fn pick(pool: &[&str]) -> String {
    pool.choose(&mut rand::thread_rng()).unwrap_or(&pool[0]).to_string()
}
