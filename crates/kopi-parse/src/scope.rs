use kopi_hir::{Local, LocalId};
use kopi_types::{Type, TypeId};

#[derive(Debug, Default)]
struct Frame {
    locals: Vec<Local>,
    types: Vec<(String, TypeId)>,
}

/// Lexical scopes of the body being parsed.
///
/// Frames below `barrier` were captured from an enclosing body while a local
/// or anonymous class is parsed; their locals are only visible after the
/// inner class's members (see [`ScopeStack::find_captured`]).
#[derive(Debug, Default)]
pub(crate) struct ScopeStack {
    frames: Vec<Frame>,
    barrier: usize,
}

impl ScopeStack {
    pub(crate) fn push(&mut self) {
        self.frames.push(Frame::default());
    }

    /// Pops the innermost frame, returning the locals it declared.
    pub(crate) fn pop(&mut self) -> Vec<Local> {
        let frame = self.frames.pop().unwrap_or_default();
        self.barrier = self.barrier.min(self.frames.len());
        frame.locals
    }

    pub(crate) fn depth(&self) -> usize {
        self.frames.len()
    }

    pub(crate) fn truncate(&mut self, depth: usize) {
        self.frames.truncate(depth);
        self.barrier = self.barrier.min(self.frames.len());
    }

    pub(crate) fn barrier(&self) -> usize {
        self.barrier
    }

    /// Captures every live frame; returns the previous barrier.
    pub(crate) fn raise_barrier(&mut self) -> usize {
        std::mem::replace(&mut self.barrier, self.frames.len())
    }

    pub(crate) fn restore_barrier(&mut self, barrier: usize) {
        self.barrier = barrier.min(self.frames.len());
    }

    pub(crate) fn declare(&mut self, local: Local) {
        if self.frames.len() <= self.barrier {
            self.push();
        }
        if let Some(frame) = self.frames.last_mut() {
            frame.locals.push(local);
        }
    }

    pub(crate) fn declare_type(&mut self, name: &str, id: TypeId) {
        if self.frames.len() <= self.barrier {
            self.push();
        }
        if let Some(frame) = self.frames.last_mut() {
            frame.types.push((name.to_string(), id));
        }
    }

    /// Updates the type of a declared local, e.g. a `var` loop variable once
    /// its iterable has been parsed.
    pub(crate) fn set_local_type(&mut self, id: LocalId, ty: Type) {
        let local = self
            .frames
            .iter_mut()
            .rev()
            .flat_map(|frame| frame.locals.iter_mut())
            .find(|local| local.id == id);
        if let Some(local) = local {
            local.ty.ty = ty;
        }
    }

    /// Innermost local named `name` in the current body.
    pub(crate) fn find_local(&self, name: &str) -> Option<&Local> {
        find_in(&self.frames[self.barrier..], name)
    }

    /// Innermost local named `name` in frames captured by a local or anonymous class.
    pub(crate) fn find_captured(&self, name: &str) -> Option<&Local> {
        find_in(&self.frames[..self.barrier], name)
    }

    /// Local class declarations are visible through the barrier.
    pub(crate) fn find_type(&self, name: &str) -> Option<TypeId> {
        self.frames.iter().rev().find_map(|frame| {
            frame
                .types
                .iter()
                .rev()
                .find(|(n, _)| n == name)
                .map(|(_, id)| *id)
        })
    }
}

fn find_in<'f>(frames: &'f [Frame], name: &str) -> Option<&'f Local> {
    frames
        .iter()
        .rev()
        .find_map(|frame| frame.locals.iter().rev().find(|local| local.name == name))
}

#[cfg(test)]
mod tests {
    use super::*;
    use kopi_core::TextRange;
    use kopi_hir::TypeRef;
    use pretty_assertions::assert_eq;

    fn local(id: u32, name: &str) -> Local {
        Local {
            id: LocalId::from_raw(id),
            modifiers: Vec::new(),
            name: name.to_string(),
            name_range: TextRange::default(),
            name_token: None,
            ty: TypeRef::new("int", Type::unknown("int"), TextRange::default()),
            extra_dims: 0,
            init: None,
        }
    }

    #[test]
    fn inner_frames_shadow_outer_ones() {
        let mut scopes = ScopeStack::default();
        scopes.push();
        scopes.declare(local(0, "x"));
        scopes.push();
        scopes.declare(local(1, "x"));
        assert_eq!(scopes.find_local("x").map(|l| l.id), Some(LocalId::from_raw(1)));
        let popped = scopes.pop();
        assert_eq!(popped.len(), 1);
        assert_eq!(scopes.find_local("x").map(|l| l.id), Some(LocalId::from_raw(0)));
    }

    #[test]
    fn barrier_hides_captured_locals_from_body_lookup() {
        let mut scopes = ScopeStack::default();
        scopes.push();
        scopes.declare(local(0, "outer"));
        let saved = scopes.raise_barrier();
        scopes.push();
        scopes.declare(local(1, "inner"));

        assert!(scopes.find_local("outer").is_none());
        assert!(scopes.find_captured("outer").is_some());
        assert!(scopes.find_local("inner").is_some());

        scopes.pop();
        scopes.restore_barrier(saved);
        assert!(scopes.find_local("outer").is_some());
    }
}
