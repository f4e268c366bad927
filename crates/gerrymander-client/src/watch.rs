use gerrymander_types::{Event, Record};

use crate::client::Client;
use crate::{Invocation, Result};

/// Follow `gerrit stream-events`, handing every recognised event to `sink`
/// until the stream closes or `sink` fails.
///
/// Pass a live client here. A caching client would replay one stale
/// capture instead of following the stream.
pub fn watch<C, F>(client: &mut C, mut sink: F) -> Result<()>
where
    C: Client + ?Sized,
    F: FnMut(Event) -> Result<()>,
{
    let invocation = Invocation::new(["stream-events"]);
    client.run(&invocation, &mut |record: Record| {
        match Event::from_record(&record) {
            Ok(Some(event)) => sink(event),
            Ok(None) => Ok(()),
            Err(err) => {
                tracing::warn!(error = %err, "skipping malformed event");
                Ok(())
            }
        }
    })
}
