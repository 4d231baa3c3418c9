//! Assistant reply post-processing.
//!
//! Replies may carry an in-band [`BOOKING_MARKER`] asking for a scheduling
//! call-to-action at that position. Only the first occurrence splits the
//! reply; later markers stay in the trailing text as literals.

/// Marker the model inserts where the booking call-to-action goes.
pub const BOOKING_MARKER: &str = "[BOOKING_LINK]";

/// Label shown on the booking call-to-action.
pub const BOOKING_LABEL: &str = "Agendar Reunión";

/// Default scheduling URL opened by the call-to-action.
pub const DEFAULT_BOOKING_URL: &str = "https://outlook.office.com/bookwithme/user/fd9524fcd26640c487ad1d7c67af9d18%40solutionspanama.com/meetingtype/QDvzcMjSuEe8-YOe90eLrg2?anonymous&ismsaljsauthenabled";

/// One renderable piece of an assistant reply.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Segment {
    /// Plain text, possibly empty.
    Text(String),
    /// Booking call-to-action control.
    BookingAction,
}

/// Split a reply into renderable segments.
///
/// Without a marker the result is a single text segment equal to the input.
/// With a marker it is always `[Text(before), BookingAction, Text(after)]`.
pub fn parse_reply(text: &str) -> Vec<Segment> {
    match text.split_once(BOOKING_MARKER) {
        Some((before, after)) => vec![
            Segment::Text(before.to_owned()),
            Segment::BookingAction,
            Segment::Text(after.to_owned()),
        ],
        None => vec![Segment::Text(text.to_owned())],
    }
}

/// Reassemble segments into reply text, reinserting the marker.
pub fn join_segments(segments: &[Segment]) -> String {
    segments
        .iter()
        .map(|segment| match segment {
            Segment::Text(text) => text.as_str(),
            Segment::BookingAction => BOOKING_MARKER,
        })
        .collect()
}

/// Number of call-to-action controls in a segment list.
pub fn action_count(segments: &[Segment]) -> usize {
    segments
        .iter()
        .filter(|segment| matches!(segment, Segment::BookingAction))
        .count()
}
