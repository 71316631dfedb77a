// extensions/timeline.rs
//
// Declarative timeline tree: tweens, cues and nested timelines placed at
// absolute times, label offsets, or after whatever came before. Building a
// timeline touches nothing; a Playhead compiles and plays it.
//
// Usage:
//   let mut step = Timeline::new();
//   step.add_label("detonation", Position::At(0.0))
//       .tween(camera_punch, Position::label("detonation", 0.0))
//       .cue(Cue::Burst, Position::label("detonation", 0.15));
//   root.append(step, Position::End(0.0));

use std::collections::HashMap;

use super::tween::Tween;

/// Where a child starts, resolved when it is inserted.
#[derive(Debug, Clone, PartialEq)]
pub enum Position {
    /// Absolute seconds from the timeline's start.
    At(f32),
    /// Offset from a label. Unknown labels resolve to the current end.
    Label(String, f32),
    /// Offset from the current end (append).
    End(f32),
}

impl Position {
    pub fn label(name: &str, offset: f32) -> Self {
        Position::Label(name.to_owned(), offset)
    }
}

#[derive(Debug, Clone)]
pub(crate) enum Child<C> {
    Tween(Tween),
    Cue(C),
    Nested(Timeline<C>),
}

/// A tree of time-placed tweens and cues.
#[derive(Debug, Clone)]
pub struct Timeline<C> {
    pub(crate) children: Vec<(f32, Child<C>)>,
    labels: HashMap<String, f32>,
    duration: f32,
}

impl<C> Default for Timeline<C> {
    fn default() -> Self {
        Self {
            children: Vec::new(),
            labels: HashMap::new(),
            duration: 0.0,
        }
    }
}

impl<C> Timeline<C> {
    pub fn new() -> Self {
        Self::default()
    }

    fn resolve(&self, position: &Position) -> f32 {
        let t = match position {
            Position::At(t) => *t,
            Position::Label(name, offset) => match self.labels.get(name) {
                Some(t) => t + offset,
                None => {
                    log::warn!("timeline: unknown label '{}', appending", name);
                    self.duration + offset
                }
            },
            Position::End(offset) => self.duration + offset,
        };
        t.max(0.0)
    }

    fn extend_to(&mut self, end: f32) {
        if end.is_finite() && end > self.duration {
            self.duration = end;
        }
    }

    /// Name a point in time. Labels take no time themselves.
    pub fn add_label(&mut self, name: &str, position: Position) -> &mut Self {
        let t = self.resolve(&position);
        self.labels.insert(name.to_owned(), t);
        self
    }

    pub fn label(&self, name: &str) -> Option<f32> {
        self.labels.get(name).copied()
    }

    pub fn tween(&mut self, tween: Tween, position: Position) -> &mut Self {
        let start = self.resolve(&position);
        self.extend_to(start + tween.total_duration());
        self.children.push((start, Child::Tween(tween)));
        self
    }

    /// A one-shot callback. Cues take no time but do extend the timeline.
    pub fn cue(&mut self, cue: C, position: Position) -> &mut Self {
        let start = self.resolve(&position);
        self.extend_to(start);
        self.children.push((start, Child::Cue(cue)));
        self
    }

    /// Nest a child timeline. Its labels stay its own.
    pub fn append(&mut self, timeline: Timeline<C>, position: Position) -> &mut Self {
        let start = self.resolve(&position);
        self.extend_to(start + timeline.duration);
        self.children.push((start, Child::Nested(timeline)));
        self
    }

    /// End of the latest child.
    pub fn duration(&self) -> f32 {
        self.duration
    }

    pub fn is_empty(&self) -> bool {
        self.children.is_empty()
    }

    /// Number of direct children.
    pub fn len(&self) -> usize {
        self.children.len()
    }

    /// Direct cues, in insertion order.
    pub fn cues(&self) -> impl Iterator<Item = (f32, &C)> {
        self.children.iter().filter_map(|(t, c)| match c {
            Child::Cue(cue) => Some((*t, cue)),
            _ => None,
        })
    }

    /// Direct nested timelines with their start times.
    pub fn segments(&self) -> impl Iterator<Item = (f32, &Timeline<C>)> {
        self.children.iter().filter_map(|(t, c)| match c {
            Child::Nested(tl) => Some((*t, tl)),
            _ => None,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::types::NodeId;
    use crate::components::node::Property;

    fn fade(seconds: f32) -> Tween {
        Tween::to(NodeId(1), Property::Opacity, 0.0, seconds)
    }

    #[test]
    fn labels_and_offsets_resolve_at_insert() {
        let mut tl: Timeline<&str> = Timeline::new();
        tl.add_label("detonation", Position::At(0.0))
            .add_label("supernova", Position::label("detonation", 0.2))
            .add_label("reformation", Position::label("supernova", 1.6));
        assert_eq!(tl.label("supernova"), Some(0.2));
        assert!((tl.label("reformation").unwrap() - 1.8).abs() < 1e-6);

        tl.tween(fade(2.0), Position::label("reformation", 0.0));
        assert!((tl.duration() - 3.8).abs() < 1e-6);
    }

    #[test]
    fn end_appends_after_previous() {
        let mut tl: Timeline<&str> = Timeline::new();
        tl.tween(fade(1.0), Position::End(0.0));
        tl.cue("gate", Position::End(0.0));
        tl.tween(fade(0.5), Position::End(0.25));
        let cues: Vec<_> = tl.cues().collect();
        assert_eq!(cues, vec![(1.0, &"gate")]);
        assert!((tl.duration() - 1.75).abs() < 1e-6);
    }

    #[test]
    fn nested_timelines_keep_their_labels() {
        let mut inner: Timeline<&str> = Timeline::new();
        inner.add_label("x", Position::At(0.5));
        inner.tween(fade(1.0), Position::label("x", 0.0));

        let mut root: Timeline<&str> = Timeline::new();
        root.tween(fade(2.0), Position::At(0.0));
        root.append(inner, Position::End(0.0));
        assert_eq!(root.label("x"), None);
        assert!((root.duration() - 3.5).abs() < 1e-6);
        assert_eq!(root.segments().count(), 1);
    }

    #[test]
    fn empty_segment_has_zero_length() {
        let mut root: Timeline<&str> = Timeline::new();
        root.append(Timeline::new(), Position::End(0.0));
        root.cue("gate", Position::End(0.0));
        assert_eq!(root.duration(), 0.0);
        assert_eq!(root.len(), 2);
    }

    #[test]
    fn unknown_label_appends() {
        let mut tl: Timeline<&str> = Timeline::new();
        tl.tween(fade(1.0), Position::At(0.0));
        tl.cue("late", Position::label("missing", 0.5));
        assert_eq!(tl.cues().next().map(|(t, _)| t), Some(1.5));
    }
}
