//! Named-command surface of the refill service.
//!
//! Commands arrive as a JSON object whose keys are command names and whose
//! values are (currently unused) arguments.  The reply has exactly one entry
//! per input key: `true` when the command was recognised and performed,
//! `false` for anything unrecognised.  An unknown command never fails the
//! whole call.  Commands run in the order the keys appear in the request.
//!
//! ```rust
//! use refill_runtime::commands::{dispatch, LoopControl};
//! use serde_json::{json, Map, Value};
//!
//! struct Noop;
//! impl LoopControl for Noop {
//!     fn start(&self) -> bool { true }
//!     fn stop(&self) -> bool { false }
//! }
//!
//! let request: Map<String, Value> = serde_json::from_value(json!({"start": {}, "foo": {}})).unwrap();
//! let reply = dispatch(&Noop, &request);
//! assert_eq!(Value::Object(reply), json!({"start": true, "foo": false}));
//! ```

use std::str::FromStr;

use serde_json::{Map, Value};
use tracing::{debug, warn};

/// Anything that can be started and stopped by name.
///
/// The return values report whether the call changed anything; the command
/// surface ignores them, since a recognised command always counts as
/// performed.
pub trait LoopControl {
    fn start(&self) -> bool;
    fn stop(&self) -> bool;
}

/// A recognised command name.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    Start,
    Stop,
}

impl FromStr for Command {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "start" => Ok(Command::Start),
            "stop" => Ok(Command::Stop),
            _ => Err(()),
        }
    }
}

/// Run every recognised command in `request` against `control`.
pub fn dispatch(control: &impl LoopControl, request: &Map<String, Value>) -> Map<String, Value> {
    request
        .keys()
        .map(|name| {
            let performed = match name.parse::<Command>() {
                Ok(Command::Start) => {
                    let spawned = control.start();
                    debug!(spawned, "start command");
                    true
                }
                Ok(Command::Stop) => {
                    let signalled = control.stop();
                    debug!(signalled, "stop command");
                    true
                }
                Err(()) => {
                    warn!(command = %name, "unrecognised command");
                    false
                }
            };
            (name.clone(), Value::Bool(performed))
        })
        .collect()
}
