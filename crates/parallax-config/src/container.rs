// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Reading passes and the resulting object container.
//!
//! A read runs four passes over the command stream:
//!
//! 1. read every file, expanding `Include` in place;
//! 2. run every `New<Type>` command;
//! 3. record every `<Type>Alias`;
//! 4. apply every `<Type>Property` in file order.
//!
//! Because all objects exist before the first property is applied, a property
//! may name an object created later in the file. Rejected commands become
//! diagnostics and the read continues; only lexical errors and an unreadable
//! top-level file abort it.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use tracing::{debug, warn};

use crate::command::{Command, CommandKind};
use crate::error::{ConfigError, ConfigResult, Location};
use crate::lexer::Lexer;
use crate::objects::{ConfigObject, NameLookup, ObjectId, TypeRegistry};
use crate::sexpr::Reader;

/// One instantiated object.
#[derive(Debug)]
pub struct Entry {
    /// Canonical type name.
    pub type_name: String,
    /// Name given in the `New` command.
    pub name: String,
    /// Where it was created.
    pub at: Location,
    /// The object.
    pub object: Box<dyn ConfigObject>,
}

#[derive(Debug, Default)]
struct NameTable {
    names: BTreeMap<(String, String), ObjectId>,
    aliases: BTreeMap<(String, String), ObjectId>,
}

impl NameTable {
    fn key(type_name: &str, name: &str) -> (String, String) {
        (type_name.to_owned(), name.to_owned())
    }

    fn is_taken(&self, type_name: &str, name: &str) -> bool {
        self.resolve(type_name, name).is_some()
    }
}

impl NameLookup for NameTable {
    fn resolve(&self, type_name: &str, name: &str) -> Option<ObjectId> {
        let key = Self::key(type_name, name);
        self.names
            .get(&key)
            .or_else(|| self.aliases.get(&key))
            .copied()
    }
}

/// Objects read from a configuration and the commands that were rejected.
#[derive(Debug, Default)]
pub struct ConfigContainer {
    entries: Vec<Entry>,
    names: NameTable,
    diagnostics: Vec<ConfigError>,
    files: Vec<PathBuf>,
}

impl ConfigContainer {
    /// Number of objects.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// `true` when no object was created.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Object `id`.
    pub fn entry(&self, id: ObjectId) -> Option<&Entry> {
        self.entries.get(id.0)
    }

    /// All objects in creation order.
    pub fn entries(&self) -> impl Iterator<Item = (ObjectId, &Entry)> {
        self.entries.iter().enumerate().map(|(i, e)| (ObjectId(i), e))
    }

    /// The object named (or aliased) `name` of canonical type `type_name`.
    pub fn resolve(&self, type_name: &str, name: &str) -> Option<ObjectId> {
        self.names.resolve(type_name, name)
    }

    /// Object `id` as a `T`.
    pub fn get<T: ConfigObject>(&self, id: ObjectId) -> Option<&T> {
        self.entry(id)?.object.as_any().downcast_ref()
    }

    /// The `T` named (or aliased) `name`.
    pub fn find<T: ConfigObject>(&self, type_name: &str, name: &str) -> Option<&T> {
        self.get(self.resolve(type_name, name)?)
    }

    /// Every object of canonical type `type_name` that is a `T`.
    pub fn of_type<'a, T: ConfigObject>(
        &'a self,
        type_name: &'a str,
    ) -> impl Iterator<Item = (ObjectId, &'a Entry, &'a T)> + 'a {
        self.entries()
            .filter(move |(_, e)| e.type_name == type_name)
            .filter_map(|(id, e)| Some((id, e, e.object.as_any().downcast_ref::<T>()?)))
    }

    /// Rejected commands, in the order they were found.
    pub fn diagnostics(&self) -> &[ConfigError] {
        &self.diagnostics
    }

    /// Files read, top-level first, as canonical paths.
    pub fn files(&self) -> &[PathBuf] {
        &self.files
    }

    fn reject(&mut self, err: ConfigError) {
        warn!(error = %err, "config command skipped");
        self.diagnostics.push(err);
    }

    fn instantiate(&mut self, types: &TypeRegistry, cmd: &Command, spelling: &str) -> ConfigResult<()> {
        let (type_name, builder) = types
            .lookup(spelling)
            .ok_or_else(|| cmd.error(format!("unknown type `{spelling}`")))?;
        let name = cmd.name_arg(0, "object name")?;
        if self.names.is_taken(type_name, name) {
            return Err(cmd.error(format!("{type_name} `{name}` already exists")));
        }
        let object = builder(name, &cmd.args[1..]).map_err(|m| cmd.error(m))?;
        let id = ObjectId(self.entries.len());
        self.names
            .names
            .insert(NameTable::key(type_name, name), id);
        self.entries.push(Entry {
            type_name: type_name.to_owned(),
            name: name.to_owned(),
            at: cmd.at.clone(),
            object,
        });
        debug!(type_name, name, "config object created");
        Ok(())
    }

    fn alias(&mut self, types: &TypeRegistry, cmd: &Command, spelling: &str) -> ConfigResult<()> {
        let type_name = types
            .canonical(spelling)
            .ok_or_else(|| cmd.error(format!("unknown type `{spelling}`")))?;
        if cmd.args.len() != 2 {
            return Err(cmd.error("takes an alias and an existing name"));
        }
        let alias = cmd.name_arg(0, "alias")?;
        let original = cmd.name_arg(1, "original name")?;
        let id = self
            .names
            .resolve(type_name, original)
            .ok_or_else(|| cmd.error(format!("no {type_name} named `{original}`")))?;
        if self.names.is_taken(type_name, alias) {
            return Err(cmd.error(format!("{type_name} `{alias}` already exists")));
        }
        self.names
            .aliases
            .insert(NameTable::key(type_name, alias), id);
        Ok(())
    }

    fn apply(&mut self, types: &TypeRegistry, cmd: &Command, spelling: &str) -> ConfigResult<()> {
        let type_name = types
            .canonical(spelling)
            .ok_or_else(|| cmd.error(format!("unknown type `{spelling}`")))?;
        let name = cmd.name_arg(0, "object name")?;
        let property = cmd.name_arg(1, "property name")?;
        let id = self
            .names
            .resolve(type_name, name)
            .ok_or_else(|| cmd.error(format!("no {type_name} named `{name}`")))?;
        let names = &self.names;
        let entry = self
            .entries
            .get_mut(id.0)
            .ok_or_else(|| cmd.error(format!("no {type_name} named `{name}`")))?;
        entry
            .object
            .set_property(property, &cmd.args[2..], names)
            .map_err(|m| cmd.error(m))
    }
}

/// Reads configuration text into a [`ConfigContainer`].
#[derive(Debug, Clone, Default)]
pub struct ConfigReader {
    vars: BTreeMap<String, String>,
    types: TypeRegistry,
}

impl ConfigReader {
    /// A reader with the built-in types and no variables.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds every process environment variable for `${VAR}` substitution.
    pub fn with_env(mut self) -> Self {
        self.vars.extend(std::env::vars());
        self
    }

    /// Defines `${name}`.
    pub fn var(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.vars.insert(name.into(), value.into());
        self
    }

    /// Types known to `New<Type>`; callers may register their own.
    pub fn types_mut(&mut self) -> &mut TypeRegistry {
        &mut self.types
    }

    /// Reads `path` and everything it includes.
    ///
    /// # Errors
    /// [`ConfigError::Io`] when `path` cannot be read and
    /// [`ConfigError::Syntax`] for lexical errors in any file. Rejected
    /// commands are reported through [`ConfigContainer::diagnostics`].
    pub fn read_file(&self, path: impl AsRef<Path>) -> ConfigResult<ConfigContainer> {
        let path = path.as_ref();
        let io = |source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        };
        let canonical = fs::canonicalize(path).map_err(io)?;
        let source = fs::read_to_string(&canonical).map_err(io)?;
        debug!(path = %path.display(), "reading config");
        let mut load = Load::new(self);
        load.enter(path.to_path_buf(), canonical, &source)?;
        Ok(load.finish())
    }

    /// Reads in-memory text named `name`. Includes resolve against the
    /// directory part of `name`.
    ///
    /// # Errors
    /// [`ConfigError::Syntax`] for lexical errors.
    pub fn read_str(&self, name: impl Into<PathBuf>, source: &str) -> ConfigResult<ConfigContainer> {
        let name = name.into();
        let mut load = Load::new(self);
        load.enter(name.clone(), name, source)?;
        Ok(load.finish())
    }
}

/// Pass 1 state.
struct Load<'r> {
    reader: &'r ConfigReader,
    stack: Vec<PathBuf>,
    commands: Vec<Command>,
    container: ConfigContainer,
}

impl<'r> Load<'r> {
    fn new(reader: &'r ConfigReader) -> Self {
        Self {
            reader,
            stack: Vec::new(),
            commands: Vec::new(),
            container: ConfigContainer::default(),
        }
    }

    fn enter(&mut self, shown: PathBuf, canonical: PathBuf, source: &str) -> ConfigResult<()> {
        let base = shown.parent().map(Path::to_path_buf).unwrap_or_default();
        let file = Arc::new(shown);
        let reader = self.reader;
        self.container.files.push(canonical.clone());
        self.stack.push(canonical);
        let mut exprs = Reader::new(
            Lexer::new(source, Arc::clone(&file), &reader.vars),
            Arc::clone(&file),
        );
        while let Some(node) = exprs.next_expr()? {
            let at = Location {
                file: Arc::clone(&file),
                line: node.line,
            };
            match Command::parse(&node, at) {
                Ok(cmd) if cmd.kind == CommandKind::Include => {
                    if let Err(err) = self.include(&cmd, &base) {
                        if matches!(err, ConfigError::Syntax { .. }) {
                            return Err(err);
                        }
                        self.container.reject(err);
                    }
                }
                Ok(cmd) => self.commands.push(cmd),
                Err(err) => self.container.reject(err),
            }
        }
        self.stack.pop();
        Ok(())
    }

    fn include(&mut self, cmd: &Command, base: &Path) -> ConfigResult<()> {
        if cmd.args.len() != 1 {
            return Err(cmd.error("takes one file name"));
        }
        let target = base.join(cmd.name_arg(0, "file name")?);
        let read_error = |e: std::io::Error| cmd.error(format!("cannot read {}: {e}", target.display()));
        let canonical = fs::canonicalize(&target).map_err(read_error)?;
        if self.stack.contains(&canonical) {
            return Err(ConfigError::IncludeCycle {
                at: cmd.at.clone(),
                path: canonical,
            });
        }
        let source = fs::read_to_string(&canonical).map_err(read_error)?;
        debug!(path = %target.display(), "including config");
        self.enter(target.clone(), canonical, &source)
    }

    fn finish(self) -> ConfigContainer {
        let Self {
            reader,
            commands,
            mut container,
            ..
        } = self;
        let types = &reader.types;
        for cmd in &commands {
            if let CommandKind::New { type_name } = &cmd.kind {
                if let Err(err) = container.instantiate(types, cmd, type_name) {
                    container.reject(err);
                }
            }
        }
        for cmd in &commands {
            if let CommandKind::Alias { type_name } = &cmd.kind {
                if let Err(err) = container.alias(types, cmd, type_name) {
                    container.reject(err);
                }
            }
        }
        for cmd in &commands {
            if let CommandKind::Property { type_name } = &cmd.kind {
                if let Err(err) = container.apply(types, cmd, type_name) {
                    container.reject(err);
                }
            }
        }
        debug!(
            objects = container.len(),
            diagnostics = container.diagnostics.len(),
            "config read"
        );
        container
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    use super::*;
    use crate::objects::{ScreenConfig, ViewConfig};

    fn read(src: &str) -> ConfigContainer {
        ConfigReader::new().read_str("test.cfg", src).unwrap()
    }

    #[test]
    fn properties_may_reference_later_objects() {
        let c = read(
            "(ViewProperty v Screen s0)\n\
             (NewView v)\n\
             (NewScreen s0 0)",
        );
        assert!(c.diagnostics().is_empty(), "{:?}", c.diagnostics());
        let view = c.find::<ViewConfig>("View", "v").unwrap();
        assert_eq!(view.screens, vec![c.resolve("Screen", "s0").unwrap()]);
    }

    #[test]
    fn aliases_resolve_to_the_same_object() {
        let c = read(
            "(NewScreen s0 0)\n\
             (ScreenAlias main s0)\n\
             (WindowProperty main PhysicalScreenWidth 0.6)",
        );
        assert!(c.diagnostics().is_empty(), "{:?}", c.diagnostics());
        assert_eq!(c.resolve("Screen", "main"), c.resolve("Screen", "s0"));
        assert_eq!(c.len(), 1);
        let s = c.find::<ScreenConfig>("Screen", "s0").unwrap();
        assert_eq!(s.physical_width, Some(0.6));
    }

    #[test]
    fn rejected_commands_are_skipped_with_their_line() {
        let c = read(
            "(NewScreen s0 0)\n\
             (NewScreen s0 1)\n\
             (ScreenAlias a nowhere)\n\
             (ScreenProperty s0 Glow 1)\n\
             (NewGizmo g)\n\
             (ScreenProperty s0 PhysicalScreenHeight 0.3)",
        );
        let lines: Vec<_> = c
            .diagnostics()
            .iter()
            .map(|d| d.location().unwrap().line)
            .collect();
        assert_eq!(lines, vec![2, 5, 3, 4]);
        let s = c.find::<ScreenConfig>("Screen", "s0").unwrap();
        assert_eq!(s.frame_buffer, 0);
        assert_eq!(s.physical_height, Some(0.3));
    }

    #[test]
    fn names_are_scoped_by_type() {
        let c = read("(NewScreen x 0) (NewView x) (ViewAlias y x) (ScreenAlias y x)");
        assert!(c.diagnostics().is_empty(), "{:?}", c.diagnostics());
        assert_ne!(c.resolve("View", "y"), c.resolve("Screen", "y"));
        assert_eq!(c.of_type::<ViewConfig>("View").count(), 1);
    }

    #[test]
    fn lexical_errors_abort_the_read() {
        let err = ConfigReader::new()
            .read_str("bad.cfg", "(NewView v)\n(ViewProperty v Screen \"open")
            .unwrap_err();
        assert!(matches!(err, ConfigError::Syntax { .. }));
    }
}
