//! The abstract program tree.
//!
//! Every synthesized program is a value of this module's types. The tree is
//! immutable from the generator's point of view; the Reducer
//! treats it as the ground truth and produces new trees by structural
//! replacement, never by mutation in place.

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// Index into `TypeUniverse::aggregates`.
pub type AggregateId = usize;
/// Index into `TypeUniverse::interfaces`.
pub type InterfaceId = usize;
/// Index into `Program::functions`. Functions are keyed by insertion order;
/// a call may only target a function with strictly greater id.
pub type FunctionId = usize;

/// Sentinel ref-escape scope standing in for "+∞".
pub const ESCAPE_STATIC: i64 = i64::MAX;
/// Ref-escape scope granted to a by-ref function parameter: it may
/// legally escape to the caller.
pub const ESCAPE_BYREF_PARAM: i64 = 1;
/// Ref-escape scope of an ordinary (by-value) parameter l-value.
pub const ESCAPE_ORDINARY_PARAM: i64 = 0;

/// One of the eleven primitive kinds a generated program may use.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PrimitiveKind {
    Bool,
    SByte,
    Byte,
    Short,
    UShort,
    Int,
    UInt,
    Long,
    ULong,
    Char,
    Float,
    Double,
}

impl PrimitiveKind {
    pub const ALL: [PrimitiveKind; 12] = [
        PrimitiveKind::Bool,
        PrimitiveKind::SByte,
        PrimitiveKind::Byte,
        PrimitiveKind::Short,
        PrimitiveKind::UShort,
        PrimitiveKind::Int,
        PrimitiveKind::UInt,
        PrimitiveKind::Long,
        PrimitiveKind::ULong,
        PrimitiveKind::Char,
        PrimitiveKind::Float,
        PrimitiveKind::Double,
    ];

    pub fn signed(self) -> bool {
        matches!(
            self,
            PrimitiveKind::SByte | PrimitiveKind::Short | PrimitiveKind::Int | PrimitiveKind::Long
        )
    }

    pub fn width_bits(self) -> u32 {
        match self {
            PrimitiveKind::Bool => 1,
            PrimitiveKind::SByte | PrimitiveKind::Byte => 8,
            PrimitiveKind::Short | PrimitiveKind::UShort => 16,
            PrimitiveKind::Int | PrimitiveKind::UInt | PrimitiveKind::Float => 32,
            PrimitiveKind::Long | PrimitiveKind::ULong | PrimitiveKind::Double => 64,
            PrimitiveKind::Char => 16,
        }
    }

    pub fn is_integral(self) -> bool {
        !matches!(self, PrimitiveKind::Float | PrimitiveKind::Double | PrimitiveKind::Bool)
    }

    pub fn is_floating(self) -> bool {
        matches!(self, PrimitiveKind::Float | PrimitiveKind::Double)
    }

    /// Source-text keyword the Printer emits for this kind.
    pub fn keyword(self) -> &'static str {
        match self {
            PrimitiveKind::Bool => "bool",
            PrimitiveKind::SByte => "sbyte",
            PrimitiveKind::Byte => "byte",
            PrimitiveKind::Short => "short",
            PrimitiveKind::UShort => "ushort",
            PrimitiveKind::Int => "int",
            PrimitiveKind::UInt => "uint",
            PrimitiveKind::Long => "long",
            PrimitiveKind::ULong => "ulong",
            PrimitiveKind::Char => "char",
            PrimitiveKind::Float => "float",
            PrimitiveKind::Double => "double",
        }
    }

    /// Can `self` be implicitly widened to `target` without a cast.
    pub fn widens_to(self, target: PrimitiveKind) -> bool {
        if self == target {
            return true;
        }
        use PrimitiveKind::*;
        let rank = |k: PrimitiveKind| -> Option<u32> {
            match k {
                SByte => Some(0),
                Byte => Some(1),
                Short => Some(2),
                UShort => Some(3),
                Int => Some(4),
                UInt => Some(5),
                Long => Some(6),
                ULong => Some(7),
                Float => Some(8),
                Double => Some(9),
                Bool | Char => None,
            }
        };
        match (rank(self), rank(target)) {
            (Some(a), Some(b)) => {
                (a < b && self.signed() == target.signed()) || (matches!(target, Float | Double) && a <= b)
            }
            _ => false,
        }
    }
}

/// A type in the generated program's type system.
///
/// Invariants upheld by construction, never by runtime checking: `Ref`
/// nests only one level; `Array` element is never `Ref`; aggregate field
/// types never reference `Ref`; the aggregate/interface implementation
/// graph is acyclic (enforced by `TypeUniverse::generate_types` only ever
/// referencing previously generated aggregates).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FuzzType {
    Primitive(PrimitiveKind),
    Array { element: Box<FuzzType>, rank: u32 },
    Aggregate(AggregateId),
    Interface(InterfaceId),
    Ref(Box<FuzzType>),
}

impl FuzzType {
    pub fn is_ref(&self) -> bool {
        matches!(self, FuzzType::Ref(_))
    }

    pub fn is_primitive(&self) -> bool {
        matches!(self, FuzzType::Primitive(_))
    }

    /// The type reached by stripping one layer of `Ref`, if any.
    pub fn strip_ref(&self) -> &FuzzType {
        match self {
            FuzzType::Ref(inner) => {
                debug_assert!(!inner.is_ref(), "Ref must not nest");
                inner
            }
            other => other,
        }
    }

    pub fn as_primitive(&self) -> Option<PrimitiveKind> {
        match self.strip_ref() {
            FuzzType::Primitive(k) => Some(*k),
            _ => None,
        }
    }

    pub fn make_ref(self) -> FuzzType {
        match self {
            FuzzType::Ref(_) => self,
            other => FuzzType::Ref(Box::new(other)),
        }
    }
}

/// A declared field or interface implementation slot, ordered.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AggregateDef {
    pub id: AggregateId,
    pub name: String,
    pub is_class: bool,
    /// Ordered list of (name, type); field types never reference `Ref`.
    pub fields: Vec<(String, FuzzType)>,
    pub implements: BTreeSet<InterfaceId>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InterfaceDef {
    pub id: InterfaceId,
    pub name: String,
    pub implementers: BTreeSet<AggregateId>,
}

/// A variable's identity plus the lifetime metadata needed for the
/// ref-escape discipline.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VariableIdentifier {
    pub ty: FuzzType,
    pub name: String,
    /// Lifetime rank: `ESCAPE_STATIC` for statics, `-depth` for locals at
    /// scope depth `depth`, `ESCAPE_BYREF_PARAM` for by-ref parameters,
    /// `ESCAPE_ORDINARY_PARAM` for ordinary parameters.
    pub ref_escape_scope: i64,
    pub read_only: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StaticField {
    pub var: VariableIdentifier,
    pub init: Expr,
}

/// A stack frame of visible locals, pushed on every block entry.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ScopeFrame(pub Vec<VariableIdentifier>);

/// One path segment below a root variable for `MemberAccess` generation
///: field projection, or array element access (always index 0,
/// since `LiteralGen` only ever produces length-1 arrays).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum PathSegment {
    Field(String),
    Index(u32),
}

/// A variable path: a root variable name plus zero or more projections.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VarPath {
    pub base: String,
    pub path: Vec<PathSegment>,
}

impl VarPath {
    pub fn root(base: impl Into<String>) -> Self {
        Self { base: base.into(), path: Vec::new() }
    }

    pub fn with_field(mut self, name: impl Into<String>) -> Self {
        self.path.push(PathSegment::Field(name.into()));
        self
    }

    pub fn with_index(mut self, i: u32) -> Self {
        self.path.push(PathSegment::Index(i));
        self
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum UnOp {
    Neg,
    Not,
    BitNot,
    PreInc,
    PreDec,
    PostInc,
    PostDec,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BinOp {
    Add,
    Sub,
    Mul,
    Div,
    Mod,
    BitAnd,
    BitOr,
    BitXor,
    Shl,
    Shr,
    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,
    And,
    Or,
}

impl BinOp {
    pub fn is_division_like(self) -> bool {
        matches!(self, BinOp::Div | BinOp::Mod)
    }

    pub fn is_shift(self) -> bool {
        matches!(self, BinOp::Shl | BinOp::Shr)
    }

    pub fn source_text(self) -> &'static str {
        match self {
            BinOp::Add => "+",
            BinOp::Sub => "-",
            BinOp::Mul => "*",
            BinOp::Div => "/",
            BinOp::Mod => "%",
            BinOp::BitAnd => "&",
            BinOp::BitOr => "|",
            BinOp::BitXor => "^",
            BinOp::Shl => "<<",
            BinOp::Shr => ">>",
            BinOp::Eq => "==",
            BinOp::Ne => "!=",
            BinOp::Lt => "<",
            BinOp::Le => "<=",
            BinOp::Gt => ">",
            BinOp::Ge => ">=",
            BinOp::And => "&&",
            BinOp::Or => "||",
        }
    }

    /// The `T op= rhs` compound-assignment spelling of this operator, for
    /// operators the Synthesizer's assignment generation may choose
    /// (arithmetic/bitwise/shift; comparison and logical operators are
    /// expression-only and never compound-assigned).
    pub fn compound_text(self) -> Option<&'static str> {
        match self {
            BinOp::Add => Some("+="),
            BinOp::Sub => Some("-="),
            BinOp::Mul => Some("*="),
            BinOp::Div => Some("/="),
            BinOp::Mod => Some("%="),
            BinOp::BitAnd => Some("&="),
            BinOp::BitOr => Some("|="),
            BinOp::BitXor => Some("^="),
            BinOp::Shl => Some("<<="),
            BinOp::Shr => Some(">>="),
            _ => None,
        }
    }
}

/// A primitive, array, or aggregate literal.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum Literal {
    Bool(bool),
    SByte(i8),
    Byte(u8),
    Short(i16),
    UShort(u16),
    Int(i32),
    UInt(u32),
    Long(i64),
    ULong(u64),
    Char(char),
    Float(f32),
    Double(f64),
    /// Fixed length-1 array with a zero (default-valued) element.
    ZeroArray { element: Box<FuzzType> },
    /// Aggregate constructed with one literal per field, in field order.
    Aggregate { id: AggregateId, fields: Vec<Literal> },
}

impl Literal {
    pub fn ty(&self) -> FuzzType {
        match self {
            Literal::Bool(_) => FuzzType::Primitive(PrimitiveKind::Bool),
            Literal::SByte(_) => FuzzType::Primitive(PrimitiveKind::SByte),
            Literal::Byte(_) => FuzzType::Primitive(PrimitiveKind::Byte),
            Literal::Short(_) => FuzzType::Primitive(PrimitiveKind::Short),
            Literal::UShort(_) => FuzzType::Primitive(PrimitiveKind::UShort),
            Literal::Int(_) => FuzzType::Primitive(PrimitiveKind::Int),
            Literal::UInt(_) => FuzzType::Primitive(PrimitiveKind::UInt),
            Literal::Long(_) => FuzzType::Primitive(PrimitiveKind::Long),
            Literal::ULong(_) => FuzzType::Primitive(PrimitiveKind::ULong),
            Literal::Char(_) => FuzzType::Primitive(PrimitiveKind::Char),
            Literal::Float(_) => FuzzType::Primitive(PrimitiveKind::Float),
            Literal::Double(_) => FuzzType::Primitive(PrimitiveKind::Double),
            Literal::ZeroArray { element } => FuzzType::Array { element: element.clone(), rank: 1 },
            Literal::Aggregate { id, .. } => FuzzType::Aggregate(*id),
        }
    }
}

/// Which function a `Call` expression invokes, and how the receiver (if
/// any) is obtained.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum CallTarget {
    /// A free/static function, called bare or class-qualified (printer's
    /// choice; both resolve to the same function).
    Static(FunctionId),
    /// An instance method invoked on a receiver expression of the
    /// function's declaring aggregate type.
    Instance { receiver: Box<Expr>, function: FunctionId },
}

impl CallTarget {
    pub fn function_id(&self) -> FunctionId {
        match self {
            CallTarget::Static(id) => *id,
            CallTarget::Instance { function, .. } => *function,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum Expr {
    Literal(Literal),
    Var(VarPath),
    Unary { op: UnOp, operand: Box<Expr> },
    Binary { op: BinOp, lhs: Box<Expr>, rhs: Box<Expr> },
    Call { target: CallTarget, args: Vec<Expr> },
    /// A cast inserted either by the Synthesizer (when an operator's
    /// natural result keyword differs from the requested keyword) or left
    /// behind by the Printer for compound-operator RHS division guards.
    Cast { to: FuzzType, expr: Box<Expr> },
    /// `ref <lvalue>` — only ever appears as the RHS of a `Ref`-typed
    /// local initializer or a ref-reassignment.
    Ref(Box<Expr>),
    New { id: AggregateId, args: Vec<Expr> },
    Paren(Box<Expr>),
    /// A checksum call-site invocation, e.g. `s_rt.Checksum("c_0", value)`
    ///. Kept as a distinct variant (rather than a plain `Call`) so
    /// the Reducer's runtime-simplification finalization step can find and
    /// rewrite every site without a name-based heuristic.
    ChecksumSite { site_id: String, value: Box<Expr> },
}

impl Expr {
    pub fn var(base: impl Into<String>) -> Expr {
        Expr::Var(VarPath::root(base))
    }
}

/// A block of statements, pushed as a fresh `ScopeFrame` at generation time
///. The `root` flag a Block carries while being
/// generated is not retained in the printed tree: only function bodies are
/// ever root blocks, and `Function::body` already identifies those.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Block(pub Vec<Stmt>);

impl Block {
    pub fn new() -> Self {
        Block(Vec::new())
    }

    pub fn push(&mut self, s: Stmt) {
        self.0.push(s);
    }
}

/// The right-hand side shape an `Assign` statement takes.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum Assign {
    /// `T x = expr;` — introduces a fresh local into the enclosing frame.
    NewLocal { ty: FuzzType, name: String, init: Expr },
    /// `lhs = ref <lvalue>;` — rebinds a `Ref`-typed l-value.
    RefRebind { lhs: VarPath, rhs: Expr },
    /// `lhs <op> rhs;` for `op` one of `=` (plain) or any compound
    /// arithmetic/bitwise/shift operator, or a pre/post inc/dec applied to
    /// `lhs` alone (`rhs` is `None` in that case).
    Compound { lhs: VarPath, op: Option<BinOp>, rhs: Option<Expr> },
    IncDec { lhs: VarPath, op: UnOp },
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum Stmt {
    Block(Block),
    Assign(Assign),
    /// A call used as a statement, or the result of the "statement
    /// containing an invocation ↦ expression-statement" simplifier.
    ExprStmt(Expr),
    If { cond: Expr, then_block: Block, else_block: Option<Block> },
    Return(Option<Expr>),
    /// `try { .. } finally { .. }`, no catches.
    TryFinally { try_block: Block, finally_block: Block },
    /// `for (int v = 0; v < bound; v++) body` with a fresh, read-only
    /// induction variable.
    For { var: String, bound: Expr, body: Block },
    /// A local declaration with no initializer, produced by the coarse
    /// pass's local-lifting transform and by the
    /// `T x = expr ↦ T x;` simplifier.
    LocalDecl { ty: FuzzType, name: String },
}

/// Carried during generation whenever the Synthesizer treats an expression
/// as assignable; not retained in the printed tree.
///
/// `ty` is always the *effective* type after stripping one layer of `Ref`
/// (reading through a ref local auto-dereferences); `is_ref_root` is true
/// only for a depth-0 path whose
/// declared type was `Ref`, i.e. the cases where ref-reassignment
/// (`lhs = ref ...`) is legal at all.
#[derive(Debug, Clone)]
pub struct LValueInfo {
    pub path: VarPath,
    pub ty: FuzzType,
    pub ref_escape_scope: i64,
    pub read_only: bool,
    pub is_ref_root: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Function {
    pub id: FunctionId,
    pub name: String,
    pub return_type: Option<FuzzType>,
    pub parameters: Vec<VariableIdentifier>,
    pub body: Block,
    pub instance_type: Option<AggregateId>,
    pub interface_type: Option<InterfaceId>,
    /// Transitive invocation counts: for each reachable function id, the
    /// summed multiplicity across call chains.
    pub call_counts: std::collections::BTreeMap<FunctionId, u64>,
}

impl Function {
    pub fn is_static_on_primary(&self) -> bool {
        self.instance_type.is_none()
    }
}

/// One top-level type declaration, in print order.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub enum TypeDecl {
    Interface(InterfaceId),
    Aggregate(AggregateId),
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Program {
    pub aggregates: Vec<AggregateDef>,
    pub interfaces: Vec<InterfaceDef>,
    /// Print order of the above two collections, interleaved.
    pub type_order: Vec<TypeDecl>,
    pub statics: Vec<StaticField>,
    pub functions: Vec<Function>,
    pub primary_class_name: String,
    pub checksum_enabled: bool,
}

impl Program {
    pub fn aggregate(&self, id: AggregateId) -> &AggregateDef {
        &self.aggregates[id]
    }

    pub fn interface(&self, id: InterfaceId) -> &InterfaceDef {
        &self.interfaces[id]
    }

    pub fn function(&self, id: FunctionId) -> &Function {
        &self.functions[id]
    }
}
