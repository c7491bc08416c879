//! The parsing engine.
//!
//! One `Engine` serves one module compilation. Parsing an outermost
//! statement opens a work window: the seed unit is scheduled, units run
//! until queued equals completed, and the window then holds zero, one,
//! or several solutions. Solutions are found by walking the bundle trie
//! with every plan simultaneously; expression sub-parses are memoized in
//! the fragment cache and replayed to every attempt that reaches the
//! same state.

use std::sync::{Arc, Mutex};

use parlance_core::fold_case;
use parlance_message::{ConversionRule, ParsingOperation};
use parlance_syntax::{
    Declaration, DeclarationKind, LexicalScanner, Phrase, Token, TokenKind, Type, Value,
};

use crate::ambiguity::discriminate;
use crate::bundle_tree::BundleTree;
use crate::error::{EngineError, ParseProblem, Solution};
use crate::expectations::{ExpectationSink, describe};
use crate::fragment_cache::{FragmentCache, Registration};
use crate::interpreter::{CodeGenerator, Interpreter, RunError};
use crate::parse_state::ParseState;
use crate::runtime::Runtime;
use crate::send;
use crate::tracer::{NoopTracer, Tracer};
use crate::work::{EngineLimits, Workshop};

/// A continuation fed with each solution of some parse.
pub type SolutionAction = Arc<dyn Fn(&Engine, &ParseState, &Arc<Phrase>) + Send + Sync>;

/// Everything an engine needs from its surroundings.
pub struct EngineConfig {
    pub runtime: Arc<Runtime>,
    pub scanner: Arc<LexicalScanner>,
    pub interpreter: Arc<dyn Interpreter>,
    pub code_generator: Arc<dyn CodeGenerator>,
    pub limits: EngineLimits,
    pub tracer: Arc<dyn Tracer>,
}

impl EngineConfig {
    pub fn new(
        runtime: Arc<Runtime>,
        scanner: Arc<LexicalScanner>,
        interpreter: Arc<dyn Interpreter>,
        code_generator: Arc<dyn CodeGenerator>,
    ) -> Self {
        Self {
            runtime,
            scanner,
            interpreter,
            code_generator,
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
}

/// The engine for one module compilation.
pub struct Engine {
    pub(crate) runtime: Arc<Runtime>,
    pub(crate) scanner: Arc<LexicalScanner>,
    pub(crate) interpreter: Arc<dyn Interpreter>,
    pub(crate) code_generator: Arc<dyn CodeGenerator>,
    pub(crate) tracer: Arc<dyn Tracer>,
    root: Mutex<Arc<BundleTree>>,
    pub fragments: FragmentCache,
    pub expectations: ExpectationSink,
    pub(crate) workshop: Workshop,
}

/// One in-flight walk of the bundle trie: a tree node, the state to
/// parse at, and the argument and mark stacks accumulated so far.
#[derive(Clone)]
pub(crate) struct SendWalk {
    pub tree: Arc<BundleTree>,
    pub state: ParseState,
    pub args: Vec<Arc<Phrase>>,
    pub marks: Vec<u32>,
    /// A pre-parsed first argument awaiting its argument instruction
    /// (leading-argument re-entry). While present, keyword edges and
    /// completions are suppressed.
    pub initial_arg: Option<Arc<Phrase>>,
    /// Whether any token has been consumed since this send began.
    pub consumed: bool,
    /// Start of the first region this send consumed directly.
    pub first_token: Option<u32>,
    /// Where the send attempt began.
    pub start: ParseState,
    /// The partial argument list assembled for the next prefix function.
    pub prefix_args: Option<Arc<Phrase>>,
    pub continuation: SolutionAction,
}

impl Engine {
    pub fn new(config: EngineConfig) -> Self {
        let root = BundleTree::root_for(config.runtime.all_bundles());
        Self {
            runtime: config.runtime,
            scanner: config.scanner,
            interpreter: config.interpreter,
            code_generator: config.code_generator,
            tracer: config.tracer,
            root: Mutex::new(root),
            fragments: FragmentCache::new(),
            expectations: ExpectationSink::new(),
            workshop: Workshop::new(config.limits),
        }
    }

    pub fn runtime(&self) -> &Arc<Runtime> {
        &self.runtime
    }

    pub fn scanner(&self) -> &Arc<LexicalScanner> {
        &self.scanner
    }

    /// The bundle trie over every currently visible message.
    pub fn root_tree(&self) -> Arc<BundleTree> {
        Arc::clone(&self.root.lock().expect("root tree poisoned"))
    }

    /// Rebuild the root after the visible message set changed (a
    /// statement executed). The fragment cache must be cleared too.
    pub fn refresh_root(&self) {
        let fresh = BundleTree::root_for(self.runtime.all_bundles());
        *self.root.lock().expect("root tree poisoned") = fresh;
    }

    /// Enqueue one work unit.
    pub fn schedule(&self, unit: impl FnOnce(&Engine) + Send + 'static) {
        self.workshop.schedule(Box::new(unit));
    }

    pub fn workshop(&self) -> &Workshop {
        &self.workshop
    }

    /// Open a work window around `seed`, demanding that exactly one
    /// solution reach the delivery action by quiescence.
    pub fn try_if_unambiguous<F>(&self, start_position: u32, seed: F) -> Result<Solution, ParseProblem>
    where
        F: FnOnce(&Engine, SolutionAction),
    {
        self.expectations.reset(start_position);
        self.workshop.begin_window();
        let solutions: Arc<Mutex<Vec<(ParseState, Arc<Phrase>)>>> =
            Arc::new(Mutex::new(Vec::new()));

        let sink = Arc::clone(&solutions);
        let action: SolutionAction = Arc::new(move |_engine, end, phrase| {
            let mut held = sink.lock().expect("solution sink poisoned");
            // Equal-state suppression: identical pairs collapse to one.
            if !held.iter().any(|(s, p)| s == end && p == phrase) {
                held.push((end.clone(), Arc::clone(phrase)));
            }
        });

        seed(self, action);
        self.workshop.on_quiescence(Box::new(|engine: &Engine| {
            let (queued, completed) = engine.workshop.counts();
            engine.tracer.quiescence(queued, completed);
        }));
        self.workshop.run(self);

        if let Some(fatal) = self.workshop.fatal_error() {
            return Err(ParseProblem::Fatal(fatal));
        }

        let held = solutions.lock().expect("solution sink poisoned");
        match held.as_slice() {
            [] => {
                let (position, expectations) = self.expectations.report();
                Err(ParseProblem::NoSolution {
                    position,
                    expectations,
                })
            }
            [(end_state, phrase)] => Ok(Solution {
                end_state: end_state.clone(),
                phrase: Arc::clone(phrase),
            }),
            [(end_a, a), (_, b), ..] => {
                let runtime = Arc::clone(&self.runtime);
                let (first, second) = discriminate(a, b, &runtime);
                Err(ParseProblem::Ambiguous {
                    end_state: end_a.clone(),
                    first,
                    second,
                })
            }
        }
    }

    /// Parse one outermost statement, demanding a unique interpretation.
    ///
    /// A statement solution must yield exactly ⊤ and stop at a `;` or at
    /// the end of input; anything else is an ordinary parse failure that
    /// feeds the expectations. The `;` itself is consumed by the caller.
    pub fn parse_outermost_statement(
        &self,
        state: &ParseState,
    ) -> Result<Solution, ParseProblem> {
        let seed_state = state.clone();
        self.try_if_unambiguous(state.position, move |engine, deliver| {
            let filter: SolutionAction = Arc::new(move |engine, end, phrase| {
                if !phrase.expression_type().is_top() {
                    engine.expectations.expect(
                        end.position,
                        describe("an expression yielding ⊤, as a statement"),
                    );
                    return;
                }
                let boundary = engine
                    .scanner
                    .tokens_at(end.position)
                    .tokens
                    .iter()
                    .any(|t| {
                        t.kind() == TokenKind::End
                            || (t.kind() == TokenKind::Operator && &**t.lexeme() == ";")
                    });
                if !boundary {
                    engine
                        .expectations
                        .expect(end.position, describe("; to end the statement"));
                    return;
                }
                deliver(engine, end, phrase);
            });
            let seed_state2 = seed_state.clone();
            engine.schedule(move |e| e.parse_expression(seed_state2, filter));
        })
    }

    // ------------------------------------------------------------------
    // Expression parsing with memoization
    // ------------------------------------------------------------------

    /// Parse an expression at `state`, feeding each solution to `action`.
    ///
    /// The first call per state starts the uncached variants; later calls
    /// only register the action and have prior solutions replayed.
    pub fn parse_expression(&self, state: ParseState, action: SolutionAction) {
        match self.fragments.register_action(&state, Arc::clone(&action)) {
            Registration::Replay(solutions) => {
                for (end, phrase) in solutions {
                    let action = Arc::clone(&action);
                    self.schedule(move |engine| action(engine, &end, &phrase));
                }
            }
            Registration::First => {
                self.start_uncached_parse(state);
            }
        }
    }

    /// Record one solution of the expression at `start`, fan it out to
    /// all registered actions, and attempt a leading-argument extension.
    fn deliver_solution(&self, start: &ParseState, end: &ParseState, phrase: &Arc<Phrase>) {
        let actions = self.fragments.add_solution(start, end, phrase);
        if actions.is_empty() {
            // Duplicate (end, phrase) pair; suppressed.
            return;
        }
        for action in actions {
            let end = end.clone();
            let phrase = Arc::clone(phrase);
            self.schedule(move |engine| action(engine, &end, &phrase));
        }

        // Any expression can be the leading argument of a larger send;
        // re-enter the trie with it pre-supplied. The completion rule
        // demands fresh tokens, so successive extensions always advance.
        let origin = start.clone();
        let continuation: SolutionAction = Arc::new(move |engine, end2, phrase2| {
            engine.deliver_solution(&origin, end2, phrase2);
        });
        let walk = SendWalk {
            tree: self.root_tree(),
            state: end.clone(),
            args: Vec::new(),
            marks: Vec::new(),
            initial_arg: Some(Arc::clone(phrase)),
            consumed: false,
            first_token: None,
            start: start.clone(),
            prefix_args: None,
            continuation,
        };
        self.schedule(move |engine| engine.run_walk(walk));
    }

    /// Schedule the uncached expression variants: simple forms, leading
    /// keyword sends, and blocks.
    fn start_uncached_parse(&self, state: ParseState) {
        let origin = state.clone();
        let record: SolutionAction = Arc::new(move |engine, end, phrase| {
            engine.deliver_solution(&origin, end, phrase);
        });

        // Simple forms: literal tokens and variable uses.
        let candidates = self.scanner.tokens_at(state.position);
        for failure in &candidates.failures {
            self.expectations
                .expect(state.position, describe(failure.to_string()));
        }
        for token in &candidates.tokens {
            match token.kind() {
                TokenKind::Literal => {
                    if let Some(phrase) = Phrase::literal(token.clone()) {
                        let end = state.at_position(token.end());
                        let phrase = Arc::new(phrase);
                        let record = Arc::clone(&record);
                        self.schedule(move |engine| record(engine, &end, &phrase));
                    }
                }
                TokenKind::Keyword => {
                    if let Some(declaration) = state.scope.lookup(token.lexeme()) {
                        let phrase = Arc::new(Phrase::VariableUse {
                            declaration: Arc::clone(declaration),
                            token: token.clone(),
                        });
                        let end = state.at_position(token.end());
                        let record = Arc::clone(&record);
                        self.schedule(move |engine| record(engine, &end, &phrase));
                    }
                }
                TokenKind::Operator if &**token.lexeme() == "[" => {
                    let after = state.at_position(token.end());
                    let start = state.clone();
                    let record = Arc::clone(&record);
                    self.schedule(move |engine| engine.parse_block(after, start, record));
                }
                _ => {}
            }
        }

        // Leading keyword sends.
        let walk = SendWalk {
            tree: self.root_tree(),
            state: state.clone(),
            args: Vec::new(),
            marks: Vec::new(),
            initial_arg: None,
            consumed: false,
            first_token: None,
            start: state,
            prefix_args: None,
            continuation: record,
        };
        self.schedule(move |engine| engine.run_walk(walk));
    }

    // ------------------------------------------------------------------
    // Bundle-trie execution
    // ------------------------------------------------------------------

    /// Execute one trie node at one state.
    pub(crate) fn run_walk(&self, walk: SendWalk) {
        let expansion = walk.tree.expand();
        self.tracer
            .tree_node(walk.state.position, walk.tree.plan_count());

        // Messages complete at this node. A send only completes once it
        // has consumed a token of its own and claimed any pre-supplied
        // leading argument.
        if walk.consumed && walk.initial_arg.is_none() {
            for plan in &expansion.complete {
                let completed = send::CompletedSend {
                    bundle: Arc::clone(&plan.bundle),
                    arguments: walk.args.clone(),
                    end_state: walk.state.clone(),
                    first_token: walk.first_token,
                    continuation: Arc::clone(&walk.continuation),
                };
                self.schedule(move |engine| send::complete_send(engine, completed));
            }
        }

        // Keyword edges, suppressed while a leading argument is pending.
        if walk.initial_arg.is_none()
            && (!expansion.exact.is_empty() || !expansion.folded.is_empty())
        {
            let candidates = self.scanner.tokens_at(walk.state.position);
            for failure in &candidates.failures {
                self.expectations
                    .expect(walk.state.position, describe(failure.to_string()));
            }
            let mut advanced = false;
            for token in &candidates.tokens {
                if !token.is_part_candidate() {
                    continue;
                }
                if let Some(symbol) = self.runtime.lookup_symbol(token.lexeme())
                    && let Some(child) = expansion.exact.get(&symbol)
                {
                    self.descend_keyword(&walk, child, token);
                    advanced = true;
                }
                let folded = fold_case(token.lexeme());
                if let Some(symbol) = self.runtime.lookup_symbol(&folded)
                    && let Some(child) = expansion.folded.get(&symbol)
                {
                    self.descend_keyword(&walk, child, token);
                    advanced = true;
                }
            }
            // Speculative walks (leading-argument extensions probing past
            // a finished expression) stay silent on mismatch; committed
            // walks and fresh statement starts record what they wanted.
            let committed = walk.consumed
                || (walk.args.is_empty() && walk.state.position == walk.start.position);
            if !advanced && committed {
                // Record what this node would have accepted.
                let keywords: Vec<Arc<str>> = expansion
                    .exact
                    .keys()
                    .chain(expansion.folded.keys())
                    .map(|symbol| self.runtime.resolve(*symbol))
                    .collect();
                self.expectations.expect(
                    walk.state.position,
                    Arc::new(move || {
                        let mut rendered: Vec<&str> =
                            keywords.iter().map(|k| &**k).collect();
                        rendered.sort_unstable();
                        format!("one of: {}", rendered.join(", "))
                    }),
                );
            }
        }

        // Actions.
        for (op, children) in &expansion.actions {
            let op = *op;
            let children = children.clone();
            let next = walk.clone();
            self.schedule(move |engine| engine.run_op(op, &children, next));
        }
    }

    fn descend_keyword(&self, walk: &SendWalk, child: &Arc<BundleTree>, token: &Token) {
        self.tracer.token_consumed(token);
        let mut next = walk.clone();
        next.tree = Arc::clone(child);
        next.state = walk.state.at_position(token.end());
        next.consumed = true;
        if next.first_token.is_none() {
            next.first_token = Some(token.start());
        }
        self.schedule(move |engine| engine.run_walk(next));
    }

    fn continue_walk(&self, mut walk: SendWalk, child: &Arc<BundleTree>) {
        walk.tree = Arc::clone(child);
        self.schedule(move |engine| engine.run_walk(walk));
    }

    /// Execute one non-keyword instruction.
    fn run_op(&self, op: ParsingOperation, children: &[Arc<BundleTree>], walk: SendWalk) {
        match op {
            ParsingOperation::ParseArgument | ParsingOperation::ParseArgumentInModuleScope => {
                self.run_parse_argument(
                    matches!(op, ParsingOperation::ParseArgumentInModuleScope),
                    children,
                    walk,
                );
            }
            ParsingOperation::ParseRawToken => {
                if walk.initial_arg.is_some() {
                    return;
                }
                let candidates = self.scanner.tokens_at(walk.state.position);
                for token in &candidates.tokens {
                    if token.kind() == TokenKind::End {
                        continue;
                    }
                    let value = token
                        .value()
                        .cloned()
                        .unwrap_or_else(|| Value::Str(Arc::clone(token.lexeme())));
                    let phrase = Arc::new(Phrase::Literal {
                        token: token.clone(),
                        value,
                    });
                    let mut next = walk.clone();
                    next.args.push(phrase);
                    next.state = walk.state.at_position(token.end());
                    next.consumed = true;
                    if next.first_token.is_none() {
                        next.first_token = Some(token.start());
                    }
                    self.continue_walk(next, &children[0]);
                }
            }
            ParsingOperation::ParseVariableReference => {
                if walk.initial_arg.is_some() {
                    return;
                }
                let candidates = self.scanner.tokens_at(walk.state.position);
                for token in &candidates.tokens {
                    if token.kind() != TokenKind::Keyword {
                        continue;
                    }
                    match walk.state.scope.lookup(token.lexeme()) {
                        Some(declaration) if declaration.kind.is_assignable() => {
                            let phrase = Arc::new(Phrase::Reference {
                                declaration: Arc::clone(declaration),
                                token: token.clone(),
                            });
                            let mut next = walk.clone();
                            next.args.push(phrase);
                            next.state = walk.state.at_position(token.end());
                            next.consumed = true;
                            if next.first_token.is_none() {
                                next.first_token = Some(token.start());
                            }
                            self.continue_walk(next, &children[0]);
                        }
                        _ => {
                            self.expectations.expect(
                                walk.state.position,
                                describe("a reference to an assignable variable"),
                            );
                        }
                    }
                }
            }
            ParsingOperation::NewList => {
                let mut next = walk;
                next.args.push(Arc::new(Phrase::List {
                    elements: Vec::new(),
                }));
                self.continue_walk(next, &children[0]);
            }
            ParsingOperation::AppendArgument => {
                let mut next = walk;
                let Some(value) = next.args.pop() else {
                    self.workshop
                        .terminate(EngineError::Invariant("append on empty stack"));
                    return;
                };
                match next.args.pop().as_deref() {
                    Some(Phrase::List { elements }) => {
                        let mut elements = elements.clone();
                        elements.push(value);
                        next.args.push(Arc::new(Phrase::List { elements }));
                        self.continue_walk(next, &children[0]);
                    }
                    _ => {
                        self.workshop
                            .terminate(EngineError::Invariant("append without a list"));
                    }
                }
            }
            ParsingOperation::Pop => {
                let mut next = walk;
                next.args.pop();
                self.continue_walk(next, &children[0]);
            }
            ParsingOperation::SavePosition => {
                let mut next = walk;
                next.marks.push(next.state.position);
                self.continue_walk(next, &children[0]);
            }
            ParsingOperation::DiscardSavedPosition => {
                let mut next = walk;
                next.marks.pop();
                self.continue_walk(next, &children[0]);
            }
            ParsingOperation::EnsureProgress => {
                let mut next = walk;
                match next.marks.last_mut() {
                    // A loop iteration that consumed nothing dies here,
                    // so empty group bodies cannot spin.
                    Some(mark) if *mark == next.state.position => {}
                    Some(mark) => {
                        *mark = next.state.position;
                        self.continue_walk(next, &children[0]);
                    }
                    None => {
                        self.workshop
                            .terminate(EngineError::Invariant("progress check without a mark"));
                    }
                }
            }
            ParsingOperation::ArgumentsCheckpoint => {
                let mut next = walk;
                next.state = next.state.with_checkpoint(next.args.clone());
                self.continue_walk(next, &children[0]);
            }
            ParsingOperation::Branch { .. } | ParsingOperation::Jump { .. } => {
                for child in children {
                    self.continue_walk(walk.clone(), child);
                }
            }
            ParsingOperation::CheckArgument { index } => {
                let child = match walk.args.last().map(|p| &**p) {
                    Some(Phrase::Send { message, .. })
                    | Some(Phrase::MacroSubstitution { message, .. }) => {
                        children[0].prefiltered(index, *message)
                    }
                    _ => Arc::clone(&children[0]),
                };
                self.continue_walk(walk, &child);
            }
            ParsingOperation::Convert { rule } => self.run_convert(rule, children, walk),
            ParsingOperation::PushTrue => {
                self.push_synthetic(walk, children, Value::Boolean(true));
            }
            ParsingOperation::PushFalse => {
                self.push_synthetic(walk, children, Value::Boolean(false));
            }
            ParsingOperation::PushIntegerLiteral { value } => {
                self.push_synthetic(walk, children, Value::Integer(value));
            }
            ParsingOperation::PrepareToRunPrefixFunction { .. } => {
                let mut next = walk;
                next.prefix_args = Some(Arc::new(Phrase::List {
                    elements: next.args.clone(),
                }));
                self.continue_walk(next, &children[0]);
            }
            ParsingOperation::RunPrefixFunction { section } => {
                self.run_prefix_function(section, children, walk);
            }
            ParsingOperation::ParsePart { .. }
            | ParsingOperation::ParsePartCaseInsensitive { .. } => {
                // Keyword matches are edges, never actions.
                self.workshop
                    .terminate(EngineError::Invariant("keyword op in action map"));
            }
        }
    }

    fn run_parse_argument(
        &self,
        module_scope: bool,
        children: &[Arc<BundleTree>],
        walk: SendWalk,
    ) {
        // A pending leading argument is claimed by the first argument
        // instruction instead of parsing.
        if walk.initial_arg.is_some() {
            let mut next = walk;
            let first = next.initial_arg.take().expect("checked above");
            next.args.push(first);
            self.continue_walk(next, &children[0]);
            return;
        }

        let parse_at = if module_scope {
            walk.state.with_empty_scope()
        } else {
            walk.state.clone()
        };
        let child = Arc::clone(&children[0]);
        let base = walk.clone();
        self.parse_expression(
            parse_at,
            Arc::new(move |engine, end, phrase| {
                let mut next = base.clone();
                next.args.push(Arc::clone(phrase));
                if end.position > base.state.position {
                    next.consumed = true;
                    if next.first_token.is_none() {
                        next.first_token = Some(base.state.position);
                    }
                }
                // Resume with the original scope; argument parses never
                // leak declarations outward.
                next.state = base.state.at_position(end.position);
                let child = Arc::clone(&child);
                engine.schedule(move |e| e.continue_walk(next, &child));
            }),
        );
    }

    fn run_convert(
        &self,
        rule: ConversionRule,
        children: &[Arc<BundleTree>],
        walk: SendWalk,
    ) {
        match rule {
            ConversionRule::NoConversion => self.continue_walk(walk, &children[0]),
            ConversionRule::ListToSize => {
                let mut next = walk;
                match next.args.pop().as_deref() {
                    Some(Phrase::List { elements }) => {
                        let size = elements.len() as i64;
                        let position = next.state.position;
                        let line = self.scanner.source().line_of(position);
                        next.args.push(Arc::new(Phrase::synthetic_literal(
                            Value::Integer(size),
                            position,
                            line,
                        )));
                        self.continue_walk(next, &children[0]);
                    }
                    _ => {
                        self.workshop
                            .terminate(EngineError::Invariant("size of a non-list"));
                    }
                }
            }
            ConversionRule::ListToNonemptiness => {
                let mut next = walk;
                match next.args.pop().as_deref() {
                    Some(Phrase::List { elements }) => {
                        let nonempty = !elements.is_empty();
                        let position = next.state.position;
                        let line = self.scanner.source().line_of(position);
                        next.args.push(Arc::new(Phrase::synthetic_literal(
                            Value::Boolean(nonempty),
                            position,
                            line,
                        )));
                        self.continue_walk(next, &children[0]);
                    }
                    _ => {
                        self.workshop
                            .terminate(EngineError::Invariant("nonemptiness of a non-list"));
                    }
                }
            }
            ConversionRule::EvaluateExpression => {
                let mut next = walk;
                let Some(phrase) = next.args.pop() else {
                    self.workshop
                        .terminate(EngineError::Invariant("evaluate on empty stack"));
                    return;
                };
                match self.evaluate_phrase(&phrase) {
                    Ok(value) => {
                        let position = next.state.position;
                        let line = self.scanner.source().line_of(position);
                        next.args.push(Arc::new(Phrase::synthetic_literal(
                            value, position, line,
                        )));
                        self.continue_walk(next, &children[0]);
                    }
                    Err(error) => {
                        self.expectations
                            .expect(next.state.position, describe(error.to_string()));
                    }
                }
            }
        }
    }

    fn push_synthetic(&self, walk: SendWalk, children: &[Arc<BundleTree>], value: Value) {
        let mut next = walk;
        let position = next.state.position;
        let line = self.scanner.source().line_of(position);
        next.args
            .push(Arc::new(Phrase::synthetic_literal(value, position, line)));
        self.continue_walk(next, &children[0]);
    }

    fn run_prefix_function(
        &self,
        section: u32,
        children: &[Arc<BundleTree>],
        walk: SendWalk,
    ) {
        let Some(prefix_args) = walk.prefix_args.clone() else {
            self.workshop
                .terminate(EngineError::Invariant("prefix function without preparation"));
            return;
        };
        let macros = children[0].macros_here();
        if macros.is_empty() {
            self.expectations.expect(
                walk.state.position,
                describe("a macro with a prefix function here"),
            );
            return;
        }
        for definition in macros {
            let Some(function) = definition.prefix_functions.get(section as usize - 1) else {
                continue;
            };
            let outcome = self.interpreter.run(
                function,
                &[Value::Phrase(Arc::clone(&prefix_args))],
                &self.runtime,
            );
            match outcome {
                Ok(result) => {
                    // The prefix function may introduce declarations for
                    // the rest of the walk.
                    let mut next = walk.clone();
                    for declaration in declarations_in(&result) {
                        next.state = next.state.with_declaration(declaration);
                    }
                    self.continue_walk(next, &children[0]);
                }
                Err(RunError::Rejected { message }) | Err(RunError::Failed { message }) => {
                    let at = walk.first_token.unwrap_or(walk.state.position);
                    self.expectations.expect(at, describe(message));
                }
            }
        }
    }

    // ------------------------------------------------------------------
    // Blocks
    // ------------------------------------------------------------------

    /// Parse a block at `at` (just past the `[`). Tries both the
    /// argument-declaration form and the bare statement form.
    fn parse_block(&self, at: ParseState, start: ParseState, record: SolutionAction) {
        if at.scope.len() as u32 >= self.workshop.limits().get_recursion_limit() {
            self.workshop.terminate(EngineError::RecursionLimitExceeded(
                self.workshop.limits().get_recursion_limit(),
            ));
            return;
        }
        self.parse_block_statements(
            at.clone(),
            start.clone(),
            Vec::new(),
            Vec::new(),
            Arc::clone(&record),
        );
        self.parse_block_arguments(at, start, Vec::new(), record);
    }

    /// Parse `name : type` argument declarations separated by `,` and
    /// terminated by `|`. Type expressions evaluate immediately, in an
    /// empty scope.
    fn parse_block_arguments(
        &self,
        at: ParseState,
        start: ParseState,
        declarations: Vec<Arc<Declaration>>,
        record: SolutionAction,
    ) {
        let candidates = self.scanner.tokens_at(at.position);
        for token in &candidates.tokens {
            if token.kind() != TokenKind::Keyword {
                continue;
            }
            let name = Arc::clone(token.lexeme());
            let name_token = token.clone();
            let after_name = at.at_position(token.end());
            for colon in &self.scanner.tokens_at(after_name.position).tokens {
                if colon.kind() != TokenKind::Operator || &**colon.lexeme() != ":" {
                    continue;
                }
                let type_at = after_name.at_position(colon.end()).with_empty_scope();
                let at = at.clone();
                let start = start.clone();
                let declarations = declarations.clone();
                let record = Arc::clone(&record);
                let name = Arc::clone(&name);
                let name_token = name_token.clone();
                self.parse_expression(
                    type_at,
                    Arc::new(move |engine, end, type_phrase| {
                        let declared = match engine.evaluate_to_type(type_phrase) {
                            Ok(t) => t,
                            Err(error) => {
                                engine
                                    .expectations
                                    .expect(end.position, describe(error));
                                return;
                            }
                        };
                        let declaration = Arc::new(
                            Declaration::new(&name, DeclarationKind::Argument, declared)
                                .with_token(name_token.clone()),
                        );
                        let mut declarations = declarations.clone();
                        declarations.push(declaration);
                        engine.block_arguments_separator(
                            at.at_position(end.position),
                            start.clone(),
                            declarations,
                            Arc::clone(&record),
                        );
                    }),
                );
            }
        }
    }

    /// After one argument declaration: `,` continues the argument list,
    /// `|` opens the statements.
    fn block_arguments_separator(
        &self,
        at: ParseState,
        start: ParseState,
        declarations: Vec<Arc<Declaration>>,
        record: SolutionAction,
    ) {
        let candidates = self.scanner.tokens_at(at.position);
        for token in &candidates.tokens {
            if token.kind() != TokenKind::Operator {
                continue;
            }
            match &**token.lexeme() {
                "," => {
                    self.parse_block_arguments(
                        at.at_position(token.end()),
                        start.clone(),
                        declarations.clone(),
                        Arc::clone(&record),
                    );
                }
                "|" => {
                    let mut scope = at.scope.clone();
                    for declaration in &declarations {
                        scope = scope.with(Arc::clone(declaration));
                    }
                    let checkpoint: Vec<Arc<Phrase>> = declarations
                        .iter()
                        .map(|d| {
                            Arc::new(Phrase::Declaration {
                                declaration: Arc::clone(d),
                                initializer: None,
                            })
                        })
                        .collect();
                    let mut body_state = at.at_position(token.end());
                    body_state.scope = scope;
                    body_state.checkpoint_args = checkpoint;
                    self.parse_block_statements(
                        body_state,
                        start.clone(),
                        declarations.clone(),
                        Vec::new(),
                        Arc::clone(&record),
                    );
                }
                _ => {}
            }
        }
    }

    /// Parse `;`-separated statements until `]`.
    fn parse_block_statements(
        &self,
        at: ParseState,
        start: ParseState,
        arguments: Vec<Arc<Declaration>>,
        statements: Vec<Arc<Phrase>>,
        record: SolutionAction,
    ) {
        let candidates = self.scanner.tokens_at(at.position);
        for token in &candidates.tokens {
            if token.kind() == TokenKind::Operator && &**token.lexeme() == "]" {
                self.finish_block(
                    at.at_position(token.end()),
                    &start,
                    arguments.clone(),
                    statements.clone(),
                    &record,
                );
            }
        }

        let at_outer = at.clone();
        let record = Arc::clone(&record);
        self.parse_expression(
            at.clone(),
            Arc::new(move |engine, end, statement| {
                // A declaration statement extends the scope for the rest
                // of the block.
                let mut after = at_outer.at_position(end.position);
                if let Phrase::Declaration { declaration, .. } = &**statement {
                    after.scope = after.scope.with(Arc::clone(declaration));
                }
                let mut statements = statements.clone();
                statements.push(Arc::clone(statement));
                for token in &engine.scanner.tokens_at(after.position).tokens {
                    if token.kind() != TokenKind::Operator {
                        continue;
                    }
                    match &**token.lexeme() {
                        ";" => {
                            engine.parse_block_statements(
                                after.at_position(token.end()),
                                start.clone(),
                                arguments.clone(),
                                statements.clone(),
                                Arc::clone(&record),
                            );
                        }
                        "]" => {
                            engine.finish_block(
                                after.at_position(token.end()),
                                &start,
                                arguments.clone(),
                                statements.clone(),
                                &record,
                            );
                        }
                        _ => {}
                    }
                }
            }),
        );
    }

    fn finish_block(
        &self,
        after_bracket: ParseState,
        start: &ParseState,
        arguments: Vec<Arc<Declaration>>,
        statements: Vec<Arc<Phrase>>,
        record: &SolutionAction,
    ) {
        let result_type = statements
            .last()
            .map(|s| s.expression_type())
            .unwrap_or(Type::Top);
        let phrase = Arc::new(Phrase::Block {
            arguments,
            statements,
            result_type,
        });
        // The block's end state resumes the enclosing scope.
        let end = ParseState {
            position: after_bracket.position,
            scope: start.scope.clone(),
            checkpoint_args: start.checkpoint_args.clone(),
        };
        let record = Arc::clone(record);
        self.schedule(move |engine| record(engine, &end, &phrase));
    }

    // ------------------------------------------------------------------
    // Parse-time evaluation
    // ------------------------------------------------------------------

    /// Compile and run a phrase right now, through the collaborators:
    /// the phrase is wrapped as a zero-argument block, generated, and
    /// applied.
    pub fn evaluate_phrase(&self, phrase: &Arc<Phrase>) -> Result<Value, RunError> {
        let block = Arc::new(Phrase::Block {
            arguments: Vec::new(),
            statements: vec![Arc::clone(phrase)],
            result_type: phrase.expression_type(),
        });
        let function = self
            .code_generator
            .generate(&block)
            .map_err(|e| RunError::failed(e.to_string()))?;
        self.interpreter.run(&function, &[], &self.runtime)
    }

    fn evaluate_to_type(&self, phrase: &Arc<Phrase>) -> Result<Type, String> {
        match self.evaluate_phrase(phrase) {
            Ok(Value::Type(t)) => Ok(t),
            Ok(other) => Err(format!(
                "a type expression (found a value of {})",
                other.type_of()
            )),
            Err(error) => Err(error.to_string()),
        }
    }
}

/// Declarations carried in a prefix function's result.
fn declarations_in(value: &Value) -> Vec<Arc<Declaration>> {
    let mut out = Vec::new();
    if let Value::Tuple(elements) = value {
        for element in elements {
            if let Value::Phrase(phrase) = element
                && let Phrase::Declaration { declaration, .. } = &**phrase
            {
                out.push(Arc::clone(declaration));
            }
        }
    }
    out
}
