use std::collections::HashMap;

use crate::{
    declarations::{ComponentDeclaration, EntryPoint},
    errors::DeclarationError,
    types::{ComponentId, Scope},
};

/// Index of a component inside the [ComponentTree]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ComponentIdx(pub(crate) usize);

pub struct Component {
    pub id: ComponentId,
    pub parent: Option<ComponentIdx>,
    pub children: Vec<ComponentIdx>,
    pub scope: Option<Scope>,
    pub entry_points: Vec<EntryPoint>,
}

/// Arena of all components, parents stored as indices
///
/// Built once from the declaration list, read only afterwards.
pub struct ComponentTree {
    components: Vec<Component>,
    by_id: HashMap<ComponentId, ComponentIdx>,
}
impl ComponentTree {
    pub fn new(declarations: Vec<ComponentDeclaration>) -> Result<Self, DeclarationError> {
        let mut by_id = HashMap::with_capacity(declarations.len());
        for (index, declaration) in declarations.iter().enumerate() {
            if by_id
                .insert(declaration.id.clone(), ComponentIdx(index))
                .is_some()
            {
                return Err(DeclarationError::DuplicateComponent(declaration.id.clone()));
            }
        }

        let mut components = Vec::with_capacity(declarations.len());
        for declaration in declarations {
            let parent = match declaration.parent {
                Some(parent) => match by_id.get(&parent) {
                    Some(index) => Some(*index),
                    None => {
                        return Err(DeclarationError::UnknownParent {
                            component: declaration.id,
                            parent,
                        })
                    }
                },
                None => None,
            };

            components.push(Component {
                id: declaration.id,
                parent,
                children: Vec::new(),
                scope: declaration.scope,
                entry_points: declaration.entry_points,
            });
        }

        for index in 0..components.len() {
            if let Some(parent) = components[index].parent {
                components[parent.0].children.push(ComponentIdx(index));
            }
        }

        let tree = ComponentTree { components, by_id };
        tree.check_acyclic()?;
        Ok(tree)
    }

    /// Every parent chain must end at a root
    fn check_acyclic(&self) -> Result<(), DeclarationError> {
        for start in self.indices() {
            let mut chain = vec![start];
            let mut current = self.get(start).parent;
            while let Some(parent) = current {
                if chain.contains(&parent) {
                    let cycle = chain.iter().map(|idx| self.get(*idx).id.clone()).collect();
                    return Err(DeclarationError::ParentCycle(cycle));
                }
                chain.push(parent);
                current = self.get(parent).parent;
            }
        }
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.components.len()
    }

    pub fn is_empty(&self) -> bool {
        self.components.is_empty()
    }

    pub fn get(&self, index: ComponentIdx) -> &Component {
        &self.components[index.0]
    }

    pub fn index_of(&self, id: &ComponentId) -> Option<ComponentIdx> {
        self.by_id.get(id).copied()
    }

    pub fn indices(&self) -> impl Iterator<Item = ComponentIdx> {
        (0..self.components.len()).map(ComponentIdx)
    }

    /// The component itself followed by all of its ancestors, nearest first
    pub fn lineage(&self, index: ComponentIdx) -> Lineage<'_> {
        Lineage {
            tree: self,
            next: Some(index),
        }
    }

    /// Returns true if `ancestor` is `component` or one of its ancestors
    pub fn is_in_lineage(&self, component: ComponentIdx, ancestor: ComponentIdx) -> bool {
        self.lineage(component).any(|idx| idx == ancestor)
    }

    /// Nearest component in the lineage carrying the given scope
    pub fn scoped_ancestor(&self, component: ComponentIdx, scope: &Scope) -> Option<ComponentIdx> {
        self.lineage(component)
            .find(|idx| self.get(*idx).scope.as_ref() == Some(scope))
    }

    /// All components, parents before children, siblings in declaration order
    pub fn pre_order(&self) -> Vec<ComponentIdx> {
        let mut order = Vec::with_capacity(self.components.len());
        let mut stack: Vec<ComponentIdx> = self
            .indices()
            .filter(|idx| self.get(*idx).parent.is_none())
            .collect();
        stack.reverse();

        while let Some(next) = stack.pop() {
            order.push(next);
            stack.extend(self.get(next).children.iter().rev().copied());
        }
        order
    }
}

pub struct Lineage<'a> {
    tree: &'a ComponentTree,
    next: Option<ComponentIdx>,
}
impl Iterator for Lineage<'_> {
    type Item = ComponentIdx;

    fn next(&mut self) -> Option<Self::Item> {
        let current = self.next?;
        self.next = self.tree.get(current).parent;
        Some(current)
    }
}
