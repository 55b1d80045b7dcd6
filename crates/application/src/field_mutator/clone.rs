use super::*;

const MAX_ID_ATTEMPTS: usize = 16;

impl FieldMutator {
    /// Duplicates a field and all of its descendants without touching the hierarchy.
    ///
    /// With fresh identifiers, references between cloned fields are rewritten to
    /// point at the clones. References to fields outside the subtree are kept.
    pub fn clone_subtree(
        &self,
        hierarchy: &ModuleHierarchy,
        source_id: &str,
        options: CloneOptions,
    ) -> AppResult<ClonedSubtree> {
        let source = hierarchy.key_of(source_id).ok_or_else(|| {
            AppError::NotFound(format!("field '{source_id}' does not exist"))
        })?;

        let mut remapping: HashMap<String, NonEmptyString> = HashMap::new();
        let mut cloned = Vec::new();
        let root_parent = hierarchy
            .node(source)
            .and_then(|node| node.definition().parent_id());
        let root_parent = root_parent.map(NonEmptyString::new).transpose()?;
        self.clone_node(
            hierarchy,
            source,
            root_parent,
            options,
            &mut remapping,
            &mut cloned,
        )?;

        let fields: Vec<FieldDefinition> = if options.generate_new_ids {
            cloned
                .iter()
                .map(|field| field.with_remapped_references(&remapping))
                .collect()
        } else {
            cloned
        };

        let root_id = fields
            .first()
            .map(|field| field.id().to_owned())
            .ok_or_else(|| AppError::Internal("clone produced no fields".to_owned()))?;
        let id_map = remapping
            .into_iter()
            .map(|(source, clone)| (source, String::from(clone)))
            .collect();

        Ok(ClonedSubtree {
            root_id,
            fields,
            id_map,
        })
    }

    /// Inserts a cloned subtree under the parent named by its root.
    ///
    /// Rejects identifier collisions, unknown parents and parents that cannot have
    /// children. The hierarchy is only replaced once every field is in place.
    pub fn paste_subtree(
        &self,
        hierarchy: &mut ModuleHierarchy,
        subtree: &ClonedSubtree,
    ) -> AppResult<NodeKey> {
        let mut seen = HashSet::new();
        for field in &subtree.fields {
            if hierarchy.contains(field.id()) || !seen.insert(field.id()) {
                return Err(AppError::Conflict(format!(
                    "field '{}' already exists in module '{}'",
                    field.id(),
                    hierarchy.module_name()
                )));
            }
        }

        let root = subtree
            .fields
            .first()
            .ok_or_else(|| AppError::Validation("cannot paste an empty subtree".to_owned()))?;
        if let Some(parent_id) = root.parent_id() {
            let parent = hierarchy.get(parent_id).ok_or_else(|| {
                AppError::NotFound(format!("target parent '{parent_id}' does not exist"))
            })?;
            if !parent.definition().field_type().can_have_children() {
                return Err(AppError::Validation(format!(
                    "field '{parent_id}' of type '{}' cannot have children",
                    parent.definition().field_type().as_str()
                )));
            }
        }

        let mut staged = hierarchy.clone();
        let mut links = Vec::with_capacity(subtree.fields.len());
        for field in &subtree.fields {
            let key = staged.insert(field.clone())?;
            links.push((key, field.parent_id().map(str::to_owned)));
        }
        for (key, parent_id) in links {
            let Some(parent_id) = parent_id else {
                continue;
            };
            let parent = staged.key_of(&parent_id).ok_or_else(|| {
                AppError::NotFound(format!("parent '{parent_id}' is not part of the subtree"))
            })?;
            staged.attach(key, parent)?;
        }

        let root_key = staged
            .key_of(root.id())
            .ok_or_else(|| AppError::Internal(format!("pasted root '{}' is missing", root.id())))?;
        *hierarchy = staged;

        info!(
            module = %hierarchy.module_name(),
            root_id = root.id(),
            fields = subtree.fields.len(),
            "pasted cloned subtree"
        );

        Ok(root_key)
    }

    fn clone_node(
        &self,
        hierarchy: &ModuleHierarchy,
        key: NodeKey,
        parent_id: Option<NonEmptyString>,
        options: CloneOptions,
        remapping: &mut HashMap<String, NonEmptyString>,
        cloned: &mut Vec<FieldDefinition>,
    ) -> AppResult<()> {
        let node = hierarchy.node(key).ok_or_else(|| {
            AppError::Internal(format!(
                "cloned node is not part of module '{}'",
                hierarchy.module_name()
            ))
        })?;
        let source = node.definition();
        let id = if options.generate_new_ids {
            self.fresh_id(hierarchy, source.id(), remapping)?
        } else {
            NonEmptyString::new(source.id())?
        };

        remapping.insert(source.id().to_owned(), id.clone());
        cloned.push(source.with_id(id.clone()).with_parent_id(parent_id));

        for child in node.children() {
            self.clone_node(
                hierarchy,
                *child,
                Some(id.clone()),
                options,
                remapping,
                cloned,
            )?;
        }

        Ok(())
    }

    fn fresh_id(
        &self,
        hierarchy: &ModuleHierarchy,
        source_id: &str,
        remapping: &HashMap<String, NonEmptyString>,
    ) -> AppResult<NonEmptyString> {
        for _ in 0..MAX_ID_ATTEMPTS {
            let candidate = self.id_generator.generate(source_id);
            if candidate.trim().is_empty() || candidate.contains(PATH_SEPARATOR) {
                continue;
            }
            let taken = hierarchy.contains(&candidate)
                || remapping
                    .iter()
                    .any(|(old, new)| old == &candidate || new.as_str() == candidate);
            if !taken {
                return NonEmptyString::new(candidate);
            }
        }

        Err(AppError::Internal(format!(
            "could not generate a unique, separator-free identifier for a clone of '{source_id}'"
        )))
    }
}
