//! Builds bindings, evaluations and executions from a resolved tree.
//!
//! Names are first matched to their declarators with C scoping rules: a
//! declarator is visible from its own initializer on, a function is visible
//! inside its own body. Bindings are then built lazily, the first time a
//! declaration is reached or referenced.
//!
//! A variable is published only once its initializer has been translated. A
//! reference that reaches a variable still being translated (`int x = x;`, or
//! `x` and `y` initialized from each other) gets a fresh recursion-resolving
//! placeholder instead. Functions are published before their bodies are
//! translated, so recursive calls refer to the real function binding and are
//! bounded by the evaluator's depth budget instead.

use cdom_ast::arena::AstArena;
use cdom_ast::errors::AstError;
use cdom_ast::nodes::{
    BuiltinType, LiteralExpression, LiteralKind, NodeCategory, NodeId, NodeKind, TypeIdOperator,
};
use rustc_hash::{FxHashMap, FxHashSet};
use tracing::{debug, info};

use crate::binding::{
    Binding, BindingId, BindingTable, FunctionBinding, RecursionResolvingBinding,
    VariableBinding,
};
use crate::errors::CollectError;
use crate::evaluation::{Evaluation, Execution};
use crate::value::Value;

/// Bindings of one tree together with the declarators they came from.
#[derive(Debug, Clone, Default)]
pub struct CollectedBindings {
    pub table: BindingTable,
    by_declarator: FxHashMap<NodeId, BindingId>,
}

impl CollectedBindings {
    /// Binding declared by `declarator`. Prototypes map to the binding of the
    /// function's definition when there is one.
    #[must_use]
    pub fn binding_for(&self, declarator: NodeId) -> Option<BindingId> {
        self.by_declarator.get(&declarator).copied()
    }

    /// First real binding named `name`.
    #[must_use]
    pub fn lookup(&self, name: &str) -> Option<BindingId> {
        self.table.find_by_name(name).next()
    }
}

pub struct BindingCollector<'a> {
    arena: &'a AstArena,
    table: BindingTable,
    /// Id-expression node to the declarator it names.
    references: FxHashMap<NodeId, NodeId>,
    /// File-scope function definitions by name, for redirecting prototypes.
    definitions: FxHashMap<String, NodeId>,
    /// File-scope declarators in document order.
    top_level: Vec<NodeId>,
    published: FxHashMap<NodeId, BindingId>,
    in_progress: FxHashSet<NodeId>,
}

impl<'a> BindingCollector<'a> {
    #[must_use]
    pub fn new(arena: &'a AstArena) -> Self {
        Self {
            arena,
            table: BindingTable::new(),
            references: FxHashMap::default(),
            definitions: FxHashMap::default(),
            top_level: Vec::new(),
            published: FxHashMap::default(),
            in_progress: FxHashSet::default(),
        }
    }

    /// Collects every binding declared under `root`.
    ///
    /// # Errors
    ///
    /// Fails with [`CollectError::UnresolvedAmbiguity`] if the tree still
    /// contains an ambiguous node.
    pub fn collect(mut self, root: NodeId) -> Result<CollectedBindings, CollectError> {
        let mut scopes = vec![FxHashMap::default()];
        self.scan(root, &mut scopes)?;
        for declarator in self.top_level.clone() {
            self.materialize(declarator, declarator)?;
        }
        let placeholders = self.table.placeholder_count();
        info!(
            bindings = self.table.len(),
            placeholders, "bindings collected"
        );
        let by_declarator = self
            .published
            .keys()
            .copied()
            .chain(self.redirected_prototypes())
            .filter_map(|declarator| {
                let canonical = self.canonical(declarator);
                self.published
                    .get(&canonical)
                    .map(|binding| (declarator, *binding))
            })
            .collect();
        Ok(CollectedBindings {
            table: self.table,
            by_declarator,
        })
    }

    fn redirected_prototypes(&self) -> Vec<NodeId> {
        self.top_level
            .iter()
            .copied()
            .filter(|declarator| self.canonical(*declarator) != *declarator)
            .collect()
    }

    fn scan(
        &mut self,
        node: NodeId,
        scopes: &mut Vec<FxHashMap<String, NodeId>>,
    ) -> Result<(), CollectError> {
        let arena = self.arena;
        let kind = arena.kind(node)?;
        if kind.is_ambiguous() {
            return Err(CollectError::UnresolvedAmbiguity { node });
        }
        match kind {
            NodeKind::FunctionDefinition(definition) => {
                self.declare(definition.declarator, scopes);
                if scopes.len() == 1 {
                    if let Some(name) = self.declared_name(definition.declarator) {
                        self.definitions.insert(name.to_string(), definition.declarator);
                    }
                }
                scopes.push(FxHashMap::default());
                if let Some(NodeKind::FunctionDeclarator(function)) =
                    arena.get(definition.declarator)
                {
                    for parameter in &function.parameters {
                        self.scan(*parameter, scopes)?;
                    }
                }
                // The body shares the parameter scope.
                if let Some(NodeKind::CompoundStatement(body)) = arena.get(definition.body) {
                    for statement in &body.statements {
                        self.scan(*statement, scopes)?;
                    }
                }
                scopes.pop();
            }
            NodeKind::CompoundStatement(compound) => {
                scopes.push(FxHashMap::default());
                for statement in &compound.statements {
                    self.scan(*statement, scopes)?;
                }
                scopes.pop();
            }
            NodeKind::SimpleDeclaration(declaration) => {
                for declarator in &declaration.declarators {
                    self.declare(*declarator, scopes);
                    // Prototype parameters are not in scope anywhere.
                    if let Some(NodeKind::Declarator(plain)) = arena.get(*declarator) {
                        if let Some(initializer) = plain.initializer {
                            self.scan(initializer, scopes)?;
                        }
                    }
                }
            }
            NodeKind::ParameterDeclaration(parameter) => {
                if let Some(declarator) = parameter.declarator {
                    self.declare(declarator, scopes);
                }
            }
            NodeKind::IdExpression(expression) => {
                if let Some(name) = arena.name_image(expression.name) {
                    let target = scopes
                        .iter()
                        .rev()
                        .find_map(|scope| scope.get(name).copied());
                    if let Some(target) = target {
                        self.references.insert(node, target);
                    }
                }
            }
            _ => {
                for (_, child) in kind.children() {
                    self.scan(child, scopes)?;
                }
            }
        }
        Ok(())
    }

    fn declare(&mut self, declarator: NodeId, scopes: &mut [FxHashMap<String, NodeId>]) {
        let Some(name) = self.declared_name(declarator) else {
            return;
        };
        let is_file_scope = scopes.len() == 1;
        if let Some(scope) = scopes.last_mut() {
            scope.insert(name.to_string(), declarator);
        }
        if is_file_scope {
            self.top_level.push(declarator);
        }
    }

    fn declared_name(&self, declarator: NodeId) -> Option<&'a str> {
        let arena: &'a AstArena = self.arena;
        match arena.get(declarator)? {
            NodeKind::Declarator(plain) => arena.name_image(plain.name),
            NodeKind::FunctionDeclarator(function) => arena.name_image(function.name),
            _ => None,
        }
    }

    /// Maps a prototype to the definition of the same function, if any.
    fn canonical(&self, declarator: NodeId) -> NodeId {
        if !matches!(
            self.arena.get(declarator),
            Some(NodeKind::FunctionDeclarator(_))
        ) {
            return declarator;
        }
        self.declared_name(declarator)
            .and_then(|name| self.definitions.get(name).copied())
            .unwrap_or(declarator)
    }

    fn function_body(&self, declarator: NodeId) -> Option<NodeId> {
        let parent = self.arena.parent(declarator)?;
        match self.arena.get(parent)? {
            NodeKind::FunctionDefinition(definition) => Some(definition.body),
            _ => None,
        }
    }

    fn materialize(
        &mut self,
        declarator: NodeId,
        requested_at: NodeId,
    ) -> Result<BindingId, CollectError> {
        let declarator = self.canonical(declarator);
        if let Some(binding) = self.published.get(&declarator) {
            return Ok(*binding);
        }
        let name = self.declared_name(declarator).unwrap_or_default().to_string();
        if self.in_progress.contains(&declarator) {
            debug!(name = %name, requested_at = %requested_at, "recursion-resolving binding created");
            return Ok(self
                .table
                .insert(Binding::RecursionResolving(RecursionResolvingBinding {
                    name,
                    requested_at,
                })));
        }

        let arena = self.arena;
        match arena.kind(declarator)? {
            NodeKind::FunctionDeclarator(function) => {
                let parameters = function.parameters.clone();
                let binding = self.table.insert(Binding::Function(FunctionBinding {
                    name,
                    declared_at: declarator,
                    parameters: Vec::new(),
                    body: None,
                }));
                self.published.insert(declarator, binding);

                let mut parameter_bindings = Vec::new();
                for parameter in parameters {
                    if let Some(NodeKind::ParameterDeclaration(parameter)) = arena.get(parameter) {
                        if let Some(parameter_declarator) = parameter.declarator {
                            parameter_bindings
                                .push(self.materialize(parameter_declarator, parameter_declarator)?);
                        }
                    }
                }
                let body = match self.function_body(declarator) {
                    Some(body) => Some(self.translate_statement(body)?),
                    None => None,
                };
                if let Some(Binding::Function(function)) = self.table.get_mut(binding) {
                    function.parameters = parameter_bindings;
                    function.body = body;
                }
                Ok(binding)
            }
            NodeKind::Declarator(plain) => {
                let initializer = plain.initializer;
                self.in_progress.insert(declarator);
                let initializer = match initializer {
                    Some(initializer) => Some(self.translate_initializer(initializer)?),
                    None => None,
                };
                self.in_progress.remove(&declarator);
                let binding = self.table.insert(Binding::Variable(VariableBinding {
                    name,
                    declared_at: declarator,
                    initializer,
                }));
                self.published.insert(declarator, binding);
                Ok(binding)
            }
            other => Err(CollectError::Ast(AstError::CategoryMismatch {
                node: declarator,
                expected: NodeCategory::Declarator,
                found: other.category(),
            })),
        }
    }

    fn translate_initializer(&mut self, initializer: NodeId) -> Result<Evaluation, CollectError> {
        let arena = self.arena;
        match arena.kind(initializer)? {
            NodeKind::EqualsInitializer(equals) => self.translate_expression(equals.value),
            _ => self.translate_expression(initializer),
        }
    }

    fn translate_expression(&mut self, node: NodeId) -> Result<Evaluation, CollectError> {
        let arena = self.arena;
        let kind = arena.kind(node)?;
        if kind.is_ambiguous() {
            return Err(CollectError::UnresolvedAmbiguity { node });
        }
        let evaluation = match kind {
            NodeKind::LiteralExpression(literal) => Evaluation::fixed(literal_value(literal)),
            NodeKind::IdExpression(_) => match self.references.get(&node).copied() {
                Some(declarator) => Evaluation::reference(self.materialize(declarator, node)?),
                None => Evaluation::fixed(Value::Unknown),
            },
            NodeKind::UnaryExpression(unary) => {
                let operator = unary.operator;
                Evaluation::unary(operator, self.translate_expression(unary.operand)?)
            }
            NodeKind::BinaryExpression(binary) => {
                let (operator, lhs, rhs) = (binary.operator, binary.lhs, binary.rhs);
                Evaluation::binary(
                    operator,
                    self.translate_expression(lhs)?,
                    self.translate_expression(rhs)?,
                )
            }
            NodeKind::ConditionalExpression(conditional) => {
                let (condition, positive, negative) =
                    (conditional.condition, conditional.positive, conditional.negative);
                Evaluation::conditional(
                    self.translate_expression(condition)?,
                    self.translate_expression(positive)?,
                    self.translate_expression(negative)?,
                )
            }
            NodeKind::FunctionCallExpression(call) => {
                let (callee, argument_nodes) = (call.function, call.arguments.clone());
                let mut arguments = Vec::with_capacity(argument_nodes.len());
                for argument in argument_nodes {
                    arguments.push(self.translate_expression(argument)?);
                }
                match self.translate_expression(callee)? {
                    Evaluation::Binding { binding, .. }
                        if self
                            .table
                            .get(binding)
                            .is_some_and(|binding| binding.as_function().is_some()) =>
                    {
                        Evaluation::Call {
                            function: binding,
                            arguments,
                        }
                    }
                    _ => Evaluation::fixed(Value::Unknown),
                }
            }
            NodeKind::CastExpression(cast) => self.translate_expression(cast.operand)?,
            NodeKind::TypeIdExpression(type_id) => {
                let size = match (type_id.operator, arena.get(type_id.type_specifier)) {
                    (TypeIdOperator::Sizeof, Some(NodeKind::SimpleDeclSpecifier(specifier))) => {
                        size_of(specifier.builtin)
                    }
                    _ => Value::Unknown,
                };
                Evaluation::fixed(size)
            }
            _ => Evaluation::fixed(Value::Unknown),
        };
        Ok(evaluation)
    }

    fn translate_statement(&mut self, node: NodeId) -> Result<Execution, CollectError> {
        let arena = self.arena;
        let kind = arena.kind(node)?;
        if kind.is_ambiguous() {
            return Err(CollectError::UnresolvedAmbiguity { node });
        }
        let execution = match kind {
            NodeKind::CompoundStatement(compound) => {
                let statements = compound.statements.clone();
                let mut executions = Vec::with_capacity(statements.len());
                for statement in statements {
                    executions.push(self.translate_statement(statement)?);
                }
                Execution::Compound(executions)
            }
            NodeKind::DeclarationStatement(statement) => {
                let declaration = statement.declaration;
                self.translate_declaration(declaration)?
            }
            NodeKind::ExpressionStatement(statement) => {
                Execution::Expression(self.translate_expression(statement.expression)?)
            }
            NodeKind::ReturnStatement(statement) => match statement.value {
                Some(value) => Execution::Return(Some(self.translate_expression(value)?)),
                None => Execution::Return(None),
            },
            NodeKind::IfStatement(statement) => {
                let (condition, then_clause, else_clause) =
                    (statement.condition, statement.then_clause, statement.else_clause);
                Execution::If {
                    condition: self.translate_expression(condition)?,
                    then_branch: Box::new(self.translate_statement(then_clause)?),
                    else_branch: match else_clause {
                        Some(else_clause) => Some(Box::new(self.translate_statement(else_clause)?)),
                        None => None,
                    },
                }
            }
            NodeKind::WhileStatement(statement) => {
                let (condition, body) = (statement.condition, statement.body);
                Execution::While {
                    condition: self.translate_expression(condition)?,
                    body: Box::new(self.translate_statement(body)?),
                }
            }
            NodeKind::BreakStatement(_) => Execution::Break,
            _ => Execution::Compound(Vec::new()),
        };
        Ok(execution)
    }

    fn translate_declaration(&mut self, declaration: NodeId) -> Result<Execution, CollectError> {
        let arena = self.arena;
        let kind = arena.kind(declaration)?;
        if kind.is_ambiguous() {
            return Err(CollectError::UnresolvedAmbiguity { node: declaration });
        }
        let NodeKind::SimpleDeclaration(simple) = kind else {
            return Ok(Execution::Compound(Vec::new()));
        };
        let mut executions = Vec::new();
        for declarator in &simple.declarators {
            let declarator = *declarator;
            if !matches!(arena.get(declarator), Some(NodeKind::Declarator(_))) {
                continue;
            }
            let binding = self.materialize(declarator, declarator)?;
            let initializer = self
                .table
                .get(binding)
                .and_then(Binding::as_variable)
                .and_then(|variable| variable.initializer.clone());
            executions.push(Execution::Declaration {
                binding,
                initializer,
            });
        }
        Ok(match executions.len() {
            1 => executions.remove(0),
            _ => Execution::Compound(executions),
        })
    }
}

fn size_of(builtin: BuiltinType) -> Value {
    match builtin {
        BuiltinType::Bool | BuiltinType::Char => Value::Integer(1),
        BuiltinType::Int | BuiltinType::Float => Value::Integer(4),
        BuiltinType::Long | BuiltinType::Double => Value::Integer(8),
        BuiltinType::Void | BuiltinType::Unspecified => Value::Unknown,
    }
}

fn literal_value(literal: &LiteralExpression) -> Value {
    let image = literal.token.image.as_str();
    match literal.kind {
        LiteralKind::Integer => parse_integer(image).map_or(Value::Unknown, Value::Integer),
        LiteralKind::Float => image
            .trim_end_matches(['f', 'F', 'l', 'L'])
            .parse::<f64>()
            .map_or(Value::Unknown, Value::Float),
        LiteralKind::Char => parse_char(image).map_or(Value::Unknown, Value::Integer),
        LiteralKind::Boolean => match image {
            "true" => Value::Integer(1),
            "false" => Value::Integer(0),
            _ => Value::Unknown,
        },
        LiteralKind::String => Value::Unknown,
    }
}

#[allow(clippy::cast_possible_wrap)]
fn parse_integer(image: &str) -> Option<i64> {
    let digits = image.trim_end_matches(['u', 'U', 'l', 'L']);
    let (digits, radix) = if let Some(hex) = digits
        .strip_prefix("0x")
        .or_else(|| digits.strip_prefix("0X"))
    {
        (hex, 16)
    } else if let Some(binary) = digits
        .strip_prefix("0b")
        .or_else(|| digits.strip_prefix("0B"))
    {
        (binary, 2)
    } else if digits.len() > 1 && digits.starts_with('0') {
        (&digits[1..], 8)
    } else {
        (digits, 10)
    };
    u64::from_str_radix(digits, radix).ok().map(|value| value as i64)
}

fn parse_char(image: &str) -> Option<i64> {
    let inner = image.strip_prefix('\'')?.strip_suffix('\'')?;
    let mut chars = inner.chars();
    let value = match (chars.next()?, chars.next()) {
        ('\\', Some(escape)) => match escape {
            'n' => '\n',
            't' => '\t',
            'r' => '\r',
            '0' => '\0',
            '\\' => '\\',
            '\'' => '\'',
            '"' => '"',
            _ => return None,
        },
        (c, None) => c,
        _ => return None,
    };
    Some(i64::from(u32::from(value)))
}
