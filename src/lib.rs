// Beans Web Chat — a coffee-loving chat assistant in a single page.
//
// The crate is split into two layers:
//   - atoms/   — error types and the provider trait. No I/O, no state.
//   - engine/  — everything that runs: chat history, the response selector
//                (canned rules or streamed OpenAI call), and the web chat
//                bridge that serves the page and speaks WebSocket JSON.
//
// The binary (`beans`) wires env-based config into `engine::webchat::start`.

pub mod atoms;
pub mod engine;
