//! Lexical scopes.
//!
//! A stack of frames mapping labels to types. Frame 0 is the root frame
//! holding builtins and top-level declarations; function bodies, loop
//! bodies, branches and `on` handlers each push a frame that is dropped
//! when the block has been checked.

use rustc_hash::FxHashMap;

use crate::ty::Type;

pub struct TypeEnv {
    frames: Vec<FxHashMap<String, Type>>,
}

/// Where a label was found.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Binding {
    /// A builtin or top-level declaration.
    Root,
    /// A parameter or local of the function being checked.
    Local,
}

impl TypeEnv {
    pub fn new() -> Self {
        TypeEnv {
            frames: vec![FxHashMap::default()],
        }
    }

    pub fn push_frame(&mut self) {
        self.frames.push(FxHashMap::default());
    }

    /// Drop the innermost frame. The root frame is never dropped.
    pub fn pop_frame(&mut self) {
        if self.frames.len() > 1 {
            self.frames.pop();
        }
    }

    /// Bind a label in the innermost frame, overwriting any binding there.
    pub fn insert(&mut self, label: String, ty: Type) {
        if let Some(frame) = self.frames.last_mut() {
            frame.insert(label, ty);
        }
    }

    /// Look a label up from the innermost frame outward.
    pub fn lookup(&self, label: &str) -> Option<&Type> {
        self.resolve(label).map(|(ty, _)| ty)
    }

    /// Like [`lookup`](Self::lookup), also telling whether the binding is
    /// a root one or a local one.
    pub fn resolve(&self, label: &str) -> Option<(&Type, Binding)> {
        self.frames
            .iter()
            .enumerate()
            .rev()
            .find_map(|(depth, frame)| {
                let binding = if depth == 0 { Binding::Root } else { Binding::Local };
                frame.get(label).map(|ty| (ty, binding))
            })
    }

    /// Whether the innermost frame binds `label`.
    pub fn contains(&self, label: &str) -> bool {
        self.frames
            .last()
            .map_or(false, |frame| frame.contains_key(label))
    }

    pub fn depth(&self) -> usize {
        self.frames.len()
    }
}

impl Default for TypeEnv {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lookup_walks_outward() {
        let mut env = TypeEnv::new();
        env.insert("double".into(), Type::int());
        env.push_frame();
        env.insert("x".into(), Type::string());

        assert_eq!(env.resolve("double"), Some((&Type::int(), Binding::Root)));
        assert_eq!(env.resolve("x"), Some((&Type::string(), Binding::Local)));
        assert!(env.lookup("y").is_none());
    }

    #[test]
    fn contains_checks_innermost_frame_only() {
        let mut env = TypeEnv::new();
        env.insert("x".into(), Type::int());
        env.push_frame();
        assert!(!env.contains("x"));
        assert!(env.lookup("x").is_some());
    }

    #[test]
    fn frames_shadow_and_unwind() {
        let mut env = TypeEnv::new();
        env.insert("x".into(), Type::int());
        env.push_frame();
        env.insert("x".into(), Type::string());
        assert_eq!(env.lookup("x"), Some(&Type::string()));

        env.pop_frame();
        assert_eq!(env.lookup("x"), Some(&Type::int()));
    }

    #[test]
    fn root_frame_survives_pop() {
        let mut env = TypeEnv::new();
        env.insert("len".into(), Type::int());
        env.pop_frame();
        assert_eq!(env.depth(), 1);
        assert!(env.contains("len"));
    }
}
