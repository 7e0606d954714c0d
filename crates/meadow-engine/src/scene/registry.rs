use super::{Arena, Handle};

/// Ordered, non-owning registry of scene entities.
///
/// Two kinds are tracked separately:
/// - models: static geometry drawn every frame
/// - blades: dynamic simulation (procedural blade fields) dispatched as compute
///
/// Registration order is iteration order. Duplicates are neither detected nor
/// rejected; registering the same handle twice makes it appear twice.
///
/// Performance characteristics:
/// - `register_*()` is O(1) amortized
/// - views are borrowed slices; no per-frame allocation
#[derive(Debug)]
pub struct EntityRegistry<M, B> {
    models: Vec<Handle<M>>,
    blades: Vec<Handle<B>>,
}

impl<M, B> Default for EntityRegistry<M, B> {
    fn default() -> Self {
        Self {
            models: Vec::new(),
            blades: Vec::new(),
        }
    }
}

impl<M, B> EntityRegistry<M, B> {
    #[inline]
    pub fn new() -> Self {
        Self::default()
    }

    #[inline]
    pub fn register_model(&mut self, model: Handle<M>) {
        self.models.push(model);
    }

    #[inline]
    pub fn register_blades(&mut self, blades: Handle<B>) {
        self.blades.push(blades);
    }

    /// Models in registration order.
    #[inline]
    pub fn models(&self) -> &[Handle<M>] {
        &self.models
    }

    /// Blade fields in registration order.
    #[inline]
    pub fn blades(&self) -> &[Handle<B>] {
        &self.blades
    }

    #[inline]
    pub fn model_count(&self) -> usize {
        self.models.len()
    }

    #[inline]
    pub fn blades_count(&self) -> usize {
        self.blades.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.models.is_empty() && self.blades.is_empty()
    }

    /// Forgets every registered handle. The entities themselves are untouched.
    pub fn clear(&mut self) {
        self.models.clear();
        self.blades.clear();
    }

    /// Resolves models through `arena`, in registration order.
    ///
    /// Handles whose entity has been removed from the arena are skipped.
    pub fn resolve_models<'a>(
        &'a self,
        arena: &'a Arena<M>,
    ) -> impl Iterator<Item = (Handle<M>, &'a M)> + 'a {
        resolve(&self.models, arena)
    }

    /// Resolves blade fields through `arena`, in registration order.
    pub fn resolve_blades<'a>(
        &'a self,
        arena: &'a Arena<B>,
    ) -> impl Iterator<Item = (Handle<B>, &'a B)> + 'a {
        resolve(&self.blades, arena)
    }
}

fn resolve<'a, T>(
    handles: &'a [Handle<T>],
    arena: &'a Arena<T>,
) -> impl Iterator<Item = (Handle<T>, &'a T)> + 'a {
    handles
        .iter()
        .filter_map(move |&h| arena.get(h).map(|v| (h, v)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, PartialEq)]
    struct Model(&'static str);
    #[derive(Debug, PartialEq)]
    struct Blades(&'static str);

    // ── ordering ──────────────────────────────────────────────────────────

    #[test]
    fn interleaved_registration_keeps_per_kind_order() {
        let mut models = Arena::new();
        let mut blades = Arena::new();
        let a = models.insert(Model("A"));
        let b = models.insert(Model("B"));
        let c = models.insert(Model("C"));
        let x = blades.insert(Blades("X"));
        let y = blades.insert(Blades("Y"));

        let mut reg = EntityRegistry::new();
        reg.register_model(a);
        reg.register_blades(x);
        reg.register_model(b);
        reg.register_blades(y);
        reg.register_model(c);

        assert_eq!(reg.models(), &[a, b, c]);
        assert_eq!(reg.blades(), &[x, y]);
    }

    #[test]
    fn registration_order_differs_from_arena_order() {
        let mut models = Arena::new();
        let first = models.insert(Model("first"));
        let second = models.insert(Model("second"));

        let mut reg: EntityRegistry<Model, Blades> = EntityRegistry::new();
        reg.register_model(second);
        reg.register_model(first);

        let names: Vec<_> = reg.resolve_models(&models).map(|(_, m)| m.0).collect();
        assert_eq!(names, vec!["second", "first"]);
    }

    #[test]
    fn duplicates_are_kept() {
        let mut models = Arena::new();
        let a = models.insert(Model("A"));

        let mut reg: EntityRegistry<Model, Blades> = EntityRegistry::new();
        reg.register_model(a);
        reg.register_model(a);

        assert_eq!(reg.models(), &[a, a]);
        assert_eq!(reg.model_count(), 2);
    }

    // ── lookup ────────────────────────────────────────────────────────────

    #[test]
    fn resolve_skips_removed_entities() {
        let mut blades = Arena::new();
        let x = blades.insert(Blades("X"));
        let y = blades.insert(Blades("Y"));

        let mut reg: EntityRegistry<Model, Blades> = EntityRegistry::new();
        reg.register_blades(x);
        reg.register_blades(y);

        blades.remove(x);

        let live: Vec<_> = reg.resolve_blades(&blades).collect();
        assert_eq!(live, vec![(y, &Blades("Y"))]);
        // The registry itself still lists both handles.
        assert_eq!(reg.blades_count(), 2);
    }

    #[test]
    fn clear_leaves_entities_alive() {
        let mut models = Arena::new();
        let a = models.insert(Model("A"));

        let mut reg: EntityRegistry<Model, Blades> = EntityRegistry::new();
        reg.register_model(a);
        reg.clear();

        assert!(reg.is_empty());
        assert_eq!(models.get(a), Some(&Model("A")));
    }

    #[test]
    fn new_registry_is_empty() {
        let reg: EntityRegistry<Model, Blades> = EntityRegistry::new();
        assert!(reg.is_empty());
        assert!(reg.models().is_empty());
        assert!(reg.blades().is_empty());
    }
}
