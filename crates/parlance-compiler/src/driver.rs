//! The module compilation driver.
//!
//! One `ModuleCompiler` holds the collaborators; `compile_text` runs the
//! whole pipeline for one module: header, imports, pragmas, then the
//! statement loop, all inside a registry transaction that commits only
//! when every statement has parsed unambiguously, type-checked as ⊤,
//! executed, and been serialized.

use std::io::Read;
use std::sync::Arc;

use indexmap::IndexMap;
use parlance_engine::{
    Engine, EngineConfig, EngineLimits, NoopTracer, ParseProblem, ParseState, Runtime, ScopeMap,
    Tracer,
};
use parlance_syntax::{
    AtomId, Declaration, DeclarationKind, LexicalScanner, Phrase, SourceText, TokenKind,
    scanner::body_registry,
};

use crate::codegen::PhraseCodeGenerator;
use crate::error::CompilationError;
use crate::header::{ModuleHeader, parse_header};
use crate::interp::{BasicInterpreter, ModuleSpace};
use crate::ir::lower_phrase;
use crate::pragma::Pragma;
use crate::primitives::PrimitiveRegistry;
use crate::serializer::{BinarySerializer, SerializedItem, Serializer};

/// Resolves sibling module names to their canonical form.
pub trait ModuleNameResolver: Send + Sync {
    fn resolve(&self, name: &str) -> Result<Arc<str>, String>;
}

/// A resolver over a fixed alias table; unlisted names resolve to
/// themselves.
#[derive(Default)]
pub struct StaticResolver {
    aliases: IndexMap<Arc<str>, Arc<str>>,
}

impl StaticResolver {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn alias(mut self, from: &str, to: &str) -> Self {
        self.aliases.insert(Arc::from(from), Arc::from(to));
        self
    }
}

impl ModuleNameResolver for StaticResolver {
    fn resolve(&self, name: &str) -> Result<Arc<str>, String> {
        Ok(self
            .aliases
            .get(name)
            .cloned()
            .unwrap_or_else(|| Arc::from(name)))
    }
}

/// What a successful compilation produced.
#[derive(Debug)]
pub struct CompiledModule {
    pub name: Arc<str>,
    pub statements: usize,
    pub atoms: IndexMap<Arc<str>, AtomId>,
    /// The checksummed module stream.
    pub stream: Vec<u8>,
}

/// The compilation front door.
pub struct ModuleCompiler {
    runtime: Arc<Runtime>,
    resolver: Arc<dyn ModuleNameResolver>,
    primitives: Arc<PrimitiveRegistry>,
    limits: EngineLimits,
    tracer: Arc<dyn Tracer>,
}

impl ModuleCompiler {
    pub fn new(
        runtime: Arc<Runtime>,
        resolver: Arc<dyn ModuleNameResolver>,
        primitives: Arc<PrimitiveRegistry>,
    ) -> Self {
        Self {
            runtime,
            resolver,
            primitives,
            limits: EngineLimits::default(),
            tracer: Arc::new(NoopTracer),
        }
    }

    pub fn limits(mut self, limits: EngineLimits) -> Self {
        self.limits = limits;
        self
    }

    pub fn tracer(mut self, tracer: Arc<dyn Tracer>) -> Self {
        self.tracer = tracer;
        self
    }

    pub fn runtime(&self) -> &Arc<Runtime> {
        &self.runtime
    }

    /// Compile a module from a UTF-8 reader.
    pub fn compile_reader(
        &self,
        module_name: &str,
        reader: &mut dyn Read,
    ) -> Result<CompiledModule, CompilationError> {
        let source =
            SourceText::read_from(module_name, reader).map_err(|e| CompilationError::Decode {
                module: module_name.to_string(),
                source: e,
            })?;
        self.compile_source(Arc::new(source))
    }

    /// Compile a module from in-memory text.
    pub fn compile_text(
        &self,
        module_name: &str,
        text: &str,
    ) -> Result<CompiledModule, CompilationError> {
        self.compile_source(Arc::new(SourceText::new(module_name, text)))
    }

    fn compile_source(
        &self,
        source: Arc<SourceText>,
    ) -> Result<CompiledModule, CompilationError> {
        let module_name = Arc::clone(source.module_name());

        // 1. Module header, with the frozen scanner.
        let header = parse_header(&source).map_err(|e| CompilationError::Header {
            module: module_name.to_string(),
            message: e.message,
            position: e.position,
            line: source.line_of(e.position.min(source.len())),
            column: source.column_of(e.position.min(source.len())),
        })?;
        if &*header.name != &*module_name {
            return Err(CompilationError::Header {
                module: module_name.to_string(),
                message: format!(
                    "module declares itself `{}` but was requested as `{module_name}`",
                    header.name
                ),
                position: 0,
                line: 1,
                column: 1,
            });
        }

        // Everything from here mutates the registry transactionally.
        let transaction = self.runtime.begin_transaction();

        // 2. Imports and public names.
        let atoms = self.apply_header(&header, &module_name)?;

        // 3. Pragmas.
        for text in &header.pragmas {
            let pragma = Pragma::parse(text).map_err(|e| CompilationError::Pragma {
                module: module_name.to_string(),
                message: e.to_string(),
            })?;
            pragma
                .apply(&self.runtime, &self.primitives)
                .map_err(|e| CompilationError::Pragma {
                    module: module_name.to_string(),
                    message: e.to_string(),
                })?;
        }

        // 4. The engine over the module body, and the collaborators that
        // execute what it parses.
        let space = ModuleSpace::new();
        let interpreter = Arc::new(BasicInterpreter::new(
            Arc::clone(&self.primitives),
            Arc::clone(&space),
        ));
        let scanner = Arc::new(LexicalScanner::new(
            Arc::clone(&source),
            Arc::new(body_registry()),
        ));
        let engine = Engine::new(
            EngineConfig::new(
                Arc::clone(&self.runtime),
                scanner,
                interpreter.clone(),
                Arc::new(PhraseCodeGenerator),
            )
            .limits(self.limits)
            .tracer(Arc::clone(&self.tracer)),
        );

        let serializer = BinarySerializer::new();
        serializer
            .serialize(&SerializedItem::HeaderSection {
                module: module_name.to_string(),
            })
            .map_err(|e| self.serialize_error(&module_name, e))?;
        serializer
            .serialize(&SerializedItem::BodySection)
            .map_err(|e| self.serialize_error(&module_name, e))?;

        // 5. The statement loop.
        let statements = self.run_statements(
            &engine,
            &source,
            &module_name,
            header.body_start,
            &interpreter,
            &serializer,
        )?;

        // 6. End of module: forwards resolved, atoms published, commit.
        let unresolved = self.runtime.unresolved_forwards();
        if !unresolved.is_empty() {
            return Err(CompilationError::UnresolvedForwards {
                module: module_name.to_string(),
                names: unresolved.iter().map(|(name, _)| name.to_string()).collect(),
            });
        }
        serializer
            .serialize(&SerializedItem::Publication {
                atoms: atoms
                    .iter()
                    .map(|(name, id)| (name.to_string(), id.0))
                    .collect(),
            })
            .map_err(|e| self.serialize_error(&module_name, e))?;

        self.runtime.add_module(parlance_engine::ModuleRecord {
            name: Arc::clone(&module_name),
            versions: header.versions.clone(),
            public_names: atoms.clone(),
        });
        transaction.commit();

        Ok(CompiledModule {
            name: module_name,
            statements,
            atoms,
            stream: serializer.finish(),
        })
    }

    /// Resolve and validate imports; mint the module's public atoms.
    fn apply_header(
        &self,
        header: &ModuleHeader,
        module_name: &Arc<str>,
    ) -> Result<IndexMap<Arc<str>, AtomId>, CompilationError> {
        let import_error = |message: String| CompilationError::Import {
            module: module_name.to_string(),
            message,
        };

        for import in header.extends.iter().chain(&header.uses) {
            let resolved = self
                .resolver
                .resolve(&import.name)
                .map_err(import_error)?;
            let record = self
                .runtime
                .module_at(&resolved)
                .ok_or_else(|| import_error(format!("module `{resolved}` is not loaded")))?;
            if !import.versions.is_empty()
                && !record.versions.is_empty()
                && !import
                    .versions
                    .iter()
                    .any(|wanted| record.versions.contains(wanted))
            {
                return Err(import_error(format!(
                    "module `{resolved}` offers none of the requested versions"
                )));
            }
            if let Some(filtered) = &import.filtered_names {
                for name in filtered {
                    if !record.public_names.contains_key(name) {
                        return Err(import_error(format!(
                            "module `{resolved}` does not export `{name}`"
                        )));
                    }
                }
            }
        }

        let mut atoms = IndexMap::new();
        for name in &header.names {
            let id = self.runtime.create_atom(name, module_name);
            atoms.insert(Arc::clone(name), id);
        }
        Ok(atoms)
    }

    fn run_statements(
        &self,
        engine: &Engine,
        source: &Arc<SourceText>,
        module_name: &Arc<str>,
        body_start: u32,
        interpreter: &Arc<BasicInterpreter>,
        serializer: &BinarySerializer,
    ) -> Result<usize, CompilationError> {
        let runtime = Arc::clone(&self.runtime);
        let resolve = move |symbol: parlance_core::Symbol| runtime.resolve(symbol);

        let mut module_scope = ScopeMap::empty();
        let mut position = body_start;
        let mut statements = 0usize;

        loop {
            // End of module?
            let ahead = engine.scanner().tokens_at(position);
            if ahead.tokens.iter().any(|t| t.kind() == TokenKind::End) {
                break;
            }

            let state = ParseState::new(position, module_scope.clone());
            let solution = engine
                .parse_outermost_statement(&state)
                .map_err(|problem| self.parse_error(source, module_name, problem))?;

            // Execute, possibly growing the module scope or the grammar.
            let phrase = peel_macro_output(&solution.phrase);
            match &*phrase {
                Phrase::Declaration {
                    declaration,
                    initializer,
                } => {
                    let promoted = promote_to_module_scope(declaration);
                    module_scope = module_scope.with(Arc::clone(&promoted));
                    if let Some(initializer) = initializer {
                        let value = engine
                            .evaluate_phrase(initializer)
                            .map_err(|e| CompilationError::Execution {
                                module: module_name.to_string(),
                                message: e.to_string(),
                            })?;
                        interpreter.space().declare(&promoted.name, value);
                        serializer
                            .serialize(&SerializedItem::Initialization {
                                name: promoted.name.to_string(),
                                value: lower_phrase(initializer, &resolve),
                            })
                            .map_err(|e| self.serialize_error(module_name, e))?;
                    }
                }
                other => {
                    serializer
                        .serialize(&SerializedItem::Statement {
                            body: lower_phrase(other, &resolve),
                        })
                        .map_err(|e| self.serialize_error(module_name, e))?;
                    engine
                        .evaluate_phrase(&phrase)
                        .map_err(|e| CompilationError::Execution {
                            module: module_name.to_string(),
                            message: e.to_string(),
                        })?;
                }
            }
            statements += 1;

            // Step past the statement and its terminating `;`.
            position = solution.end_state.position;
            if let Some(semicolon) = engine
                .scanner()
                .tokens_at(position)
                .tokens
                .iter()
                .find(|t| t.kind() == TokenKind::Operator && &**t.lexeme() == ";")
            {
                position = semicolon.end();
            }

            // The statement may have changed the visible grammar.
            engine.fragments.clear();
            engine.refresh_root();
        }
        Ok(statements)
    }

    fn parse_error(
        &self,
        source: &Arc<SourceText>,
        module_name: &Arc<str>,
        problem: ParseProblem,
    ) -> CompilationError {
        match problem {
            ParseProblem::NoSolution {
                position,
                expectations,
            } => CompilationError::Parse {
                module: module_name.to_string(),
                position,
                line: source.line_of(position.min(source.len())),
                column: source.column_of(position.min(source.len())),
                expectations,
            },
            ParseProblem::Ambiguous {
                end_state,
                first,
                second,
            } => CompilationError::Ambiguity {
                module: module_name.to_string(),
                position: end_state.position,
                line: source.line_of(end_state.position.min(source.len())),
                column: source.column_of(end_state.position.min(source.len())),
                first,
                second,
            },
            ParseProblem::Fatal(error) => CompilationError::Internal {
                module: module_name.to_string(),
                message: error.to_string(),
            },
        }
    }

    fn serialize_error(
        &self,
        module_name: &Arc<str>,
        error: crate::serializer::SerializeError,
    ) -> CompilationError {
        CompilationError::Serialize {
            module: module_name.to_string(),
            message: error.to_string(),
        }
    }
}

/// Unwrap macro substitutions to the phrase that should execute.
fn peel_macro_output(phrase: &Arc<Phrase>) -> Arc<Phrase> {
    let mut current = Arc::clone(phrase);
    while let Phrase::MacroSubstitution { replacement, .. } = &*current {
        let next = Arc::clone(replacement);
        current = next;
    }
    current
}

/// Top-level declarations bind at module scope.
fn promote_to_module_scope(declaration: &Arc<Declaration>) -> Arc<Declaration> {
    let kind = match declaration.kind {
        DeclarationKind::LocalConstant | DeclarationKind::ModuleConstant => {
            DeclarationKind::ModuleConstant
        }
        _ => DeclarationKind::ModuleVariable,
    };
    Arc::new(Declaration {
        name: Arc::clone(&declaration.name),
        kind,
        declared_type: declaration.declared_type.clone(),
        token: declaration.token.clone(),
    })
}
