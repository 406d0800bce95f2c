//! Text-based LLVM IR generation
//!
//! This module generates LLVM IR as text (.ll files) that can be compiled
//! with clang or llc. It doesn't require the LLVM C API, making it portable
//! and easy to debug.
//!
//! Lowering assumes the checker succeeded: types are read off the annotated
//! AST and are not re-verified. Global variables get zero initializers and
//! their real initializers run inside a synthesized `_global_init` function,
//! called once from the prologue of `main`.

use std::collections::HashMap;
use std::fmt::Write;
use thiserror::Error;

use crate::ast::{
    BinOp, Decl, DeclKind, Expr, ExprKind, Literal, Param, ParamKind, Program, Stmt, StmtKind,
    Type, UnOp,
};

/// Code generation error
#[derive(Debug, Error)]
pub enum CodeGenError {
    #[error("Unknown variable: {0}")]
    UnknownVariable(String),

    #[error("Unknown function: {0}")]
    UnknownFunction(String),

    #[error("string values are not lowered to LLVM IR")]
    UnsupportedString,

    #[error("operator '{op}' is not supported for {operand} operands")]
    UnsupportedOp { op: String, operand: String },

    #[error("'{0}' is not an array")]
    NotAnArray(String),

    #[error("global array '{0}' needs an integer literal size")]
    NonConstantArraySize(String),

    #[error("array '{0}' has no size expression")]
    MissingArraySize(String),

    #[error("nested function '{0}' is not supported")]
    NestedFunction(String),

    #[error("'{0}' statement has no condition")]
    MissingCondition(&'static str),

    #[error("expression is not an assignable location")]
    InvalidAssignTarget,

    #[error("'{0}' has void type and cannot be stored")]
    VoidVariable(String),

    #[error("Formatting error: {0}")]
    Format(#[from] std::fmt::Error),
}

type GenResult<T> = Result<T, CodeGenError>;

/// An emitted SSA value or constant, with its LLVM type
#[derive(Debug, Clone)]
struct Value {
    text: String,
    ty: &'static str,
}

/// Where a name lives
#[derive(Debug, Clone)]
enum Slot {
    Scalar {
        ptr: String,
        ty: &'static str,
    },
    Array {
        ptr: String,
        elem: &'static str,
        /// `Some` for globals of aggregate type `[len x elem]`
        len: Option<i64>,
    },
}

/// Text-based LLVM IR generator
pub struct CodeGen {
    target_triple: String,
    out: String,
    tmp: usize,
    label: usize,
    globals: HashMap<String, Slot>,
    locals: HashMap<String, Slot>,
    /// function name -> return type
    functions: HashMap<String, &'static str>,
    /// current insertion block already ends in a terminator
    terminated: bool,
}

impl CodeGen {
    pub fn new() -> Self {
        Self::with_target(default_target_triple())
    }

    pub fn with_target(target: impl Into<String>) -> Self {
        Self {
            target_triple: target.into(),
            out: String::new(),
            tmp: 0,
            label: 0,
            globals: HashMap::new(),
            locals: HashMap::new(),
            functions: HashMap::new(),
            terminated: false,
        }
    }

    /// Generate the complete LLVM IR module as text
    pub fn generate(mut self, program: &Program) -> GenResult<String> {
        writeln!(self.out, "; ModuleID = 'bminor'")?;
        writeln!(self.out, "target triple = \"{}\"", self.target_triple)?;
        writeln!(self.out)?;

        self.emit_runtime_declarations()?;

        for decl in &program.decls {
            if let DeclKind::Func { name, ret, .. } = &decl.kind {
                self.functions.insert(name.clone(), llvm_type(*ret)?);
            }
        }

        self.emit_globals(program)?;
        self.emit_global_init(program)?;

        for decl in &program.decls {
            if let DeclKind::Func { name, ret, params, body } = &decl.kind {
                self.emit_function(name, *ret, params, body.as_deref())?;
            }
        }

        Ok(self.out)
    }

    fn emit_runtime_declarations(&mut self) -> GenResult<()> {
        writeln!(self.out, "; Print runtime")?;
        writeln!(self.out, "declare void @_printi(i32)")?;
        writeln!(self.out, "declare void @_printf(double)")?;
        writeln!(self.out, "declare void @_printb(i1)")?;
        writeln!(self.out, "declare void @_printc(i8)")?;
        writeln!(self.out)?;
        Ok(())
    }

    /// One `.global` per top-level variable or array, zero-initialized;
    /// literal initializers are deferred to `_global_init`.
    fn emit_globals(&mut self, program: &Program) -> GenResult<()> {
        let mut wrote = false;

        for decl in &program.decls {
            match &decl.kind {
                DeclKind::Var { name, ty, .. } => {
                    let llvm_ty = llvm_type(*ty)?;
                    if llvm_ty == "void" {
                        return Err(CodeGenError::VoidVariable(name.clone()));
                    }
                    writeln!(
                        self.out,
                        "@{name}.global = common global {llvm_ty} {}",
                        zero_value(llvm_ty)
                    )?;
                    self.globals.insert(
                        name.clone(),
                        Slot::Scalar { ptr: format!("@{name}.global"), ty: llvm_ty },
                    );
                    wrote = true;
                }
                DeclKind::Array { name, elem, size, .. } => {
                    let elem_ty = llvm_type(*elem)?;
                    let len = const_array_len(name, size.as_deref())?;
                    writeln!(
                        self.out,
                        "@{name}.global = common global [{len} x {elem_ty}] zeroinitializer"
                    )?;
                    self.globals.insert(
                        name.clone(),
                        Slot::Array {
                            ptr: format!("@{name}.global"),
                            elem: elem_ty,
                            len: Some(len),
                        },
                    );
                    wrote = true;
                }
                DeclKind::Func { .. } => {}
            }
        }

        if wrote {
            writeln!(self.out)?;
        }
        Ok(())
    }

    /// The deferred initializer stores, in declaration order
    fn emit_global_init(&mut self, program: &Program) -> GenResult<()> {
        self.tmp = 0;
        self.locals.clear();
        self.terminated = false;

        writeln!(self.out, "define void @_global_init() {{")?;
        writeln!(self.out, "entry:")?;

        for decl in &program.decls {
            match &decl.kind {
                DeclKind::Var { name, init: Some(init), .. } => {
                    let value = self.emit_expr(init)?;
                    writeln!(
                        self.out,
                        "  store {} {}, ptr @{name}.global",
                        value.ty, value.text
                    )?;
                }
                DeclKind::Array { name, elem, init: Some(init), .. } => {
                    let elem_ty = llvm_type(*elem)?;
                    let len = match self.globals.get(name) {
                        Some(Slot::Array { len: Some(len), .. }) => *len,
                        _ => return Err(CodeGenError::UnknownVariable(name.clone())),
                    };
                    for (i, element) in init.iter().enumerate() {
                        let value = self.emit_expr(element)?;
                        let slot = self.tmp();
                        writeln!(
                            self.out,
                            "  {slot} = getelementptr [{len} x {elem_ty}], ptr @{name}.global, i32 0, i32 {i}"
                        )?;
                        writeln!(self.out, "  store {} {}, ptr {slot}", value.ty, value.text)?;
                    }
                }
                _ => {}
            }
        }

        writeln!(self.out, "  ret void")?;
        writeln!(self.out, "}}")?;
        writeln!(self.out)?;
        Ok(())
    }

    fn emit_function(
        &mut self,
        name: &str,
        ret: Type,
        params: &[Param],
        body: Option<&[Stmt]>,
    ) -> GenResult<()> {
        let ret_ty = llvm_type(ret)?;

        let body = match body {
            Some(body) => body,
            None => {
                // forward declaration
                let mut types = Vec::new();
                for param in params {
                    types.push(self.param_type(param)?.to_string());
                }
                writeln!(self.out, "declare {ret_ty} @{name}({})", types.join(", "))?;
                writeln!(self.out)?;
                return Ok(());
            }
        };

        let mut signature = Vec::new();
        for param in params {
            let ty = self.param_type(param)?;
            signature.push(format!("{ty} %{}", param.name));
        }

        writeln!(self.out, "define {ret_ty} @{name}({}) {{", signature.join(", "))?;
        writeln!(self.out, "entry:")?;

        self.tmp = 0;
        self.label = 0;
        self.locals.clear();
        self.terminated = false;

        // scalar parameters spill to the stack; array parameters are used
        // through the incoming pointer
        for param in params {
            match &param.kind {
                ParamKind::Value => {
                    let ty = llvm_type(param.ty)?;
                    writeln!(self.out, "  %{0}.addr = alloca {ty}", param.name)?;
                    writeln!(self.out, "  store {ty} %{0}, ptr %{0}.addr", param.name)?;
                    self.locals.insert(
                        param.name.clone(),
                        Slot::Scalar { ptr: format!("%{}.addr", param.name), ty },
                    );
                }
                ParamKind::Array { .. } => {
                    let elem = llvm_type(param.ty)?;
                    self.locals.insert(
                        param.name.clone(),
                        Slot::Array { ptr: format!("%{}", param.name), elem, len: None },
                    );
                }
            }
        }

        if name == "main" {
            writeln!(self.out, "  call void @_global_init()")?;
        }

        for stmt in body {
            self.emit_stmt(stmt)?;
        }

        if !self.terminated {
            if ret_ty == "void" {
                writeln!(self.out, "  ret void")?;
            } else {
                writeln!(self.out, "  unreachable")?;
            }
        }

        writeln!(self.out, "}}")?;
        writeln!(self.out)?;
        Ok(())
    }

    fn param_type(&self, param: &Param) -> GenResult<&'static str> {
        match &param.kind {
            ParamKind::Value => {
                let ty = llvm_type(param.ty)?;
                if ty == "void" {
                    return Err(CodeGenError::VoidVariable(param.name.clone()));
                }
                Ok(ty)
            }
            ParamKind::Array { .. } => Ok("ptr"),
        }
    }

    // == Statements ==

    fn emit_stmt(&mut self, stmt: &Stmt) -> GenResult<()> {
        match &stmt.kind {
            StmtKind::Expr(expr) => {
                self.ensure_block()?;
                self.emit_expr(expr)?;
                Ok(())
            }

            StmtKind::Print { args } => {
                self.ensure_block()?;
                for arg in args {
                    let value = self.emit_expr(arg)?;
                    let runtime = match value.ty {
                        "i32" => "_printi",
                        "double" => "_printf",
                        "i1" => "_printb",
                        "i8" => "_printc",
                        other => {
                            return Err(CodeGenError::UnsupportedOp {
                                op: "print".to_string(),
                                operand: other.to_string(),
                            })
                        }
                    };
                    writeln!(self.out, "  call void @{runtime}({} {})", value.ty, value.text)?;
                }
                Ok(())
            }

            StmtKind::Return { value } => {
                self.ensure_block()?;
                match value {
                    Some(value) => {
                        let value = self.emit_expr(value)?;
                        writeln!(self.out, "  ret {} {}", value.ty, value.text)?;
                    }
                    None => writeln!(self.out, "  ret void")?,
                }
                self.terminated = true;
                Ok(())
            }

            StmtKind::Block { body } => {
                for stmt in body {
                    self.emit_stmt(stmt)?;
                }
                Ok(())
            }

            StmtKind::Decl(decl) => self.emit_local_decl(decl),

            StmtKind::If { cond, then_branch, else_branch } => {
                self.ensure_block()?;
                let cond = cond.as_ref().ok_or(CodeGenError::MissingCondition("if"))?;
                let cond_value = self.emit_expr(cond)?;

                let id = self.block_id();
                let then_label = format!("if.then.{id}");
                let else_label = format!("if.else.{id}");
                let merge_label = format!("if.merge.{id}");

                let false_target = if else_branch.is_some() { &else_label } else { &merge_label };
                self.cond_branch(&cond_value, &then_label, false_target)?;

                self.start_block(&then_label)?;
                self.emit_stmt(then_branch)?;
                self.branch_to(&merge_label)?;

                if let Some(else_branch) = else_branch {
                    self.start_block(&else_label)?;
                    self.emit_stmt(else_branch)?;
                    self.branch_to(&merge_label)?;
                }

                self.start_block(&merge_label)?;
                Ok(())
            }

            StmtKind::While { cond, body } => {
                self.ensure_block()?;
                let cond = cond.as_ref().ok_or(CodeGenError::MissingCondition("while"))?;

                let id = self.block_id();
                let cond_label = format!("while.cond.{id}");
                let body_label = format!("while.body.{id}");
                let end_label = format!("while.end.{id}");

                self.branch_to(&cond_label)?;
                self.start_block(&cond_label)?;
                let cond_value = self.emit_expr(cond)?;
                self.cond_branch(&cond_value, &body_label, &end_label)?;

                self.start_block(&body_label)?;
                self.emit_stmt(body)?;
                self.branch_to(&cond_label)?;

                self.start_block(&end_label)?;
                Ok(())
            }

            StmtKind::DoWhile { body, cond } => {
                self.ensure_block()?;
                let cond = cond.as_ref().ok_or(CodeGenError::MissingCondition("do-while"))?;

                let id = self.block_id();
                let body_label = format!("dowhile.body.{id}");
                let cond_label = format!("dowhile.cond.{id}");
                let end_label = format!("dowhile.end.{id}");

                self.branch_to(&body_label)?;
                self.start_block(&body_label)?;
                self.emit_stmt(body)?;
                self.branch_to(&cond_label)?;

                self.start_block(&cond_label)?;
                let cond_value = self.emit_expr(cond)?;
                self.cond_branch(&cond_value, &body_label, &end_label)?;

                self.start_block(&end_label)?;
                Ok(())
            }

            StmtKind::For { init, cond, incr, body } => {
                self.ensure_block()?;
                if let Some(init) = init {
                    self.emit_expr(init)?;
                }

                let cond = cond.as_ref().ok_or(CodeGenError::MissingCondition("for"))?;

                let id = self.block_id();
                let cond_label = format!("for.cond.{id}");
                let body_label = format!("for.body.{id}");
                let end_label = format!("for.end.{id}");

                self.branch_to(&cond_label)?;
                self.start_block(&cond_label)?;
                let cond_value = self.emit_expr(cond)?;
                self.cond_branch(&cond_value, &body_label, &end_label)?;

                self.start_block(&body_label)?;
                self.emit_stmt(body)?;
                // the increment writes back through its own store
                if !self.terminated {
                    if let Some(incr) = incr {
                        self.emit_expr(incr)?;
                    }
                }
                self.branch_to(&cond_label)?;

                self.start_block(&end_label)?;
                Ok(())
            }
        }
    }

    fn emit_local_decl(&mut self, decl: &Decl) -> GenResult<()> {
        match &decl.kind {
            DeclKind::Var { name, ty, init } => {
                self.ensure_block()?;
                let llvm_ty = llvm_type(*ty)?;
                if llvm_ty == "void" {
                    return Err(CodeGenError::VoidVariable(name.clone()));
                }

                let ptr = self.local_ptr(name);
                writeln!(self.out, "  {ptr} = alloca {llvm_ty}")?;
                self.locals
                    .insert(name.clone(), Slot::Scalar { ptr: ptr.clone(), ty: llvm_ty });

                if let Some(init) = init {
                    let value = self.emit_expr(init)?;
                    writeln!(self.out, "  store {} {}, ptr {ptr}", value.ty, value.text)?;
                }
                Ok(())
            }

            DeclKind::Array { name, elem, size, init } => {
                self.ensure_block()?;
                let elem_ty = llvm_type(*elem)?;
                let size = size
                    .as_deref()
                    .ok_or_else(|| CodeGenError::MissingArraySize(name.clone()))?;
                let size_value = self.emit_expr(size)?;

                let ptr = self.local_ptr(name);
                writeln!(
                    self.out,
                    "  {ptr} = alloca {elem_ty}, {} {}",
                    size_value.ty, size_value.text
                )?;
                self.locals
                    .insert(name.clone(), Slot::Array { ptr: ptr.clone(), elem: elem_ty, len: None });

                if let Some(init) = init {
                    for (i, element) in init.iter().enumerate() {
                        let value = self.emit_expr(element)?;
                        let slot = self.tmp();
                        writeln!(
                            self.out,
                            "  {slot} = getelementptr {elem_ty}, ptr {ptr}, i32 {i}"
                        )?;
                        writeln!(self.out, "  store {} {}, ptr {slot}", value.ty, value.text)?;
                    }
                }
                Ok(())
            }

            DeclKind::Func { name, .. } => Err(CodeGenError::NestedFunction(name.clone())),
        }
    }

    // == Expressions ==

    fn emit_expr(&mut self, expr: &Expr) -> GenResult<Value> {
        match &expr.kind {
            ExprKind::Literal(literal) => emit_literal(literal),

            ExprKind::Var { name } => match self.lookup(name)? {
                Slot::Scalar { ptr, ty } => {
                    let tmp = self.tmp();
                    writeln!(self.out, "  {tmp} = load {ty}, ptr {ptr}")?;
                    Ok(Value { text: tmp, ty })
                }
                // arrays evaluate to their base pointer
                Slot::Array { ptr, .. } => Ok(Value { text: ptr, ty: "ptr" }),
            },

            ExprKind::Index { name, index } => {
                let (ptr, ty) = self.element_ptr(name, index)?;
                let tmp = self.tmp();
                writeln!(self.out, "  {tmp} = load {ty}, ptr {ptr}")?;
                Ok(Value { text: tmp, ty })
            }

            ExprKind::Call { name, args } => {
                let mut values = Vec::new();
                for arg in args {
                    values.push(self.emit_expr(arg)?);
                }
                let ret = self
                    .functions
                    .get(name)
                    .copied()
                    .ok_or_else(|| CodeGenError::UnknownFunction(name.clone()))?;

                let arg_list = values
                    .iter()
                    .map(|v| format!("{} {}", v.ty, v.text))
                    .collect::<Vec<_>>()
                    .join(", ");

                if ret == "void" {
                    writeln!(self.out, "  call void @{name}({arg_list})")?;
                    Ok(Value { text: String::new(), ty: "void" })
                } else {
                    let tmp = self.tmp();
                    writeln!(self.out, "  {tmp} = call {ret} @{name}({arg_list})")?;
                    Ok(Value { text: tmp, ty: ret })
                }
            }

            ExprKind::Binary { op, left, right } => {
                let left = self.emit_expr(left)?;
                let right = self.emit_expr(right)?;
                self.emit_binop(*op, &left, &right)
            }

            ExprKind::Unary { op, postfix, expr: operand } => {
                self.emit_unary(*op, *postfix, operand)
            }

            ExprKind::Assign { target, value } => {
                let value = self.emit_expr(value)?;
                let (ptr, _) = self.location(target)?;
                writeln!(self.out, "  store {} {}, ptr {ptr}", value.ty, value.text)?;
                Ok(value)
            }
        }
    }

    fn emit_binop(&mut self, op: BinOp, left: &Value, right: &Value) -> GenResult<Value> {
        use BinOp::*;

        let (inst, result_ty): (&str, &'static str) = match (left.ty, op) {
            ("i32", Add) => ("add i32", "i32"),
            ("i32", Sub) => ("sub i32", "i32"),
            ("i32", Mul) => ("mul i32", "i32"),
            ("i32", Div) => ("sdiv i32", "i32"),
            ("i32", Mod) => ("srem i32", "i32"),
            ("i32", Lt) => ("icmp slt i32", "i1"),
            ("i32", Le) => ("icmp sle i32", "i1"),
            ("i32", Gt) => ("icmp sgt i32", "i1"),
            ("i32", Ge) => ("icmp sge i32", "i1"),
            ("i32", Eq) => ("icmp eq i32", "i1"),
            ("i32", Ne) => ("icmp ne i32", "i1"),

            ("double", Add) => ("fadd double", "double"),
            ("double", Sub) => ("fsub double", "double"),
            ("double", Mul) => ("fmul double", "double"),
            ("double", Div) => ("fdiv double", "double"),
            ("double", Lt) => ("fcmp olt double", "i1"),
            ("double", Le) => ("fcmp ole double", "i1"),
            ("double", Gt) => ("fcmp ogt double", "i1"),
            ("double", Ge) => ("fcmp oge double", "i1"),
            ("double", Eq) => ("fcmp oeq double", "i1"),
            ("double", Ne) => ("fcmp one double", "i1"),

            ("i1", And) => ("and i1", "i1"),
            ("i1", Or) => ("or i1", "i1"),
            ("i1", Eq) => ("icmp eq i1", "i1"),
            ("i1", Ne) => ("icmp ne i1", "i1"),

            ("i8", Lt) => ("icmp slt i8", "i1"),
            ("i8", Le) => ("icmp sle i8", "i1"),
            ("i8", Gt) => ("icmp sgt i8", "i1"),
            ("i8", Ge) => ("icmp sge i8", "i1"),
            ("i8", Eq) => ("icmp eq i8", "i1"),
            ("i8", Ne) => ("icmp ne i8", "i1"),

            _ => {
                return Err(CodeGenError::UnsupportedOp {
                    op: op.to_string(),
                    operand: left.ty.to_string(),
                })
            }
        };

        let tmp = self.tmp();
        writeln!(self.out, "  {tmp} = {inst} {}, {}", left.text, right.text)?;
        Ok(Value { text: tmp, ty: result_ty })
    }

    fn emit_unary(&mut self, op: UnOp, postfix: bool, operand: &Expr) -> GenResult<Value> {
        match op {
            UnOp::Inc | UnOp::Dec => {
                let (ptr, ty) = self.location(operand)?;
                let old = self.tmp();
                writeln!(self.out, "  {old} = load {ty}, ptr {ptr}")?;
                let new = self.tmp();
                let inst = if op == UnOp::Inc { "add" } else { "sub" };
                writeln!(self.out, "  {new} = {inst} {ty} {old}, 1")?;
                writeln!(self.out, "  store {ty} {new}, ptr {ptr}")?;
                Ok(Value { text: if postfix { old } else { new }, ty })
            }

            UnOp::Plus => self.emit_expr(operand),

            UnOp::Neg => {
                let value = self.emit_expr(operand)?;
                let tmp = self.tmp();
                match value.ty {
                    "i32" => writeln!(self.out, "  {tmp} = sub i32 0, {}", value.text)?,
                    "double" => writeln!(
                        self.out,
                        "  {tmp} = fsub double {}, {}",
                        fmt_float(0.0),
                        value.text
                    )?,
                    _ => {
                        return Err(CodeGenError::UnsupportedOp {
                            op: op.to_string(),
                            operand: value.ty.to_string(),
                        })
                    }
                }
                Ok(Value { text: tmp, ty: value.ty })
            }

            UnOp::Not => {
                let value = self.emit_expr(operand)?;
                if value.ty != "i1" {
                    return Err(CodeGenError::UnsupportedOp {
                        op: op.to_string(),
                        operand: value.ty.to_string(),
                    });
                }
                let tmp = self.tmp();
                writeln!(self.out, "  {tmp} = xor i1 {}, 1", value.text)?;
                Ok(Value { text: tmp, ty: "i1" })
            }
        }
    }

    /// Pointer and element type of an assignable location
    fn location(&mut self, expr: &Expr) -> GenResult<(String, &'static str)> {
        match &expr.kind {
            ExprKind::Var { name } => match self.lookup(name)? {
                Slot::Scalar { ptr, ty } => Ok((ptr, ty)),
                Slot::Array { ptr, elem, .. } => Ok((ptr, elem)),
            },
            ExprKind::Index { name, index } => self.element_ptr(name, index),
            _ => Err(CodeGenError::InvalidAssignTarget),
        }
    }

    /// GEP to one array slot
    fn element_ptr(&mut self, name: &str, index: &Expr) -> GenResult<(String, &'static str)> {
        let index_value = self.emit_expr(index)?;
        match self.lookup(name)? {
            Slot::Array { ptr, elem, len } => {
                let tmp = self.tmp();
                match len {
                    Some(len) => writeln!(
                        self.out,
                        "  {tmp} = getelementptr [{len} x {elem}], ptr {ptr}, i32 0, {} {}",
                        index_value.ty, index_value.text
                    )?,
                    None => writeln!(
                        self.out,
                        "  {tmp} = getelementptr {elem}, ptr {ptr}, {} {}",
                        index_value.ty, index_value.text
                    )?,
                }
                Ok((tmp, elem))
            }
            Slot::Scalar { .. } => Err(CodeGenError::NotAnArray(name.to_string())),
        }
    }

    /// Locals shadow globals
    fn lookup(&self, name: &str) -> GenResult<Slot> {
        self.locals
            .get(name)
            .or_else(|| self.globals.get(name))
            .cloned()
            .ok_or_else(|| CodeGenError::UnknownVariable(name.to_string()))
    }

    fn tmp(&mut self) -> String {
        self.tmp += 1;
        format!("%t{}", self.tmp)
    }

    fn block_id(&mut self) -> usize {
        self.label += 1;
        self.label
    }

    /// Stack slot name for a local; shadowed names get a fresh suffix
    fn local_ptr(&mut self, name: &str) -> String {
        if self.locals.contains_key(name) {
            self.tmp += 1;
            format!("%{name}.addr.{}", self.tmp)
        } else {
            format!("%{name}.addr")
        }
    }

    fn start_block(&mut self, label: &str) -> GenResult<()> {
        writeln!(self.out, "{label}:")?;
        self.terminated = false;
        Ok(())
    }

    /// Branch to `label` unless the current block already has a terminator
    fn branch_to(&mut self, label: &str) -> GenResult<()> {
        if !self.terminated {
            writeln!(self.out, "  br label %{label}")?;
            self.terminated = true;
        }
        Ok(())
    }

    fn cond_branch(&mut self, cond: &Value, then_label: &str, else_label: &str) -> GenResult<()> {
        writeln!(
            self.out,
            "  br i1 {}, label %{then_label}, label %{else_label}",
            cond.text
        )?;
        self.terminated = true;
        Ok(())
    }

    /// Open a fresh block when the current one is already terminated, so no
    /// instruction ever lands after a terminator
    fn ensure_block(&mut self) -> GenResult<()> {
        if self.terminated {
            let id = self.block_id();
            let label = format!("cont.{id}");
            self.start_block(&label)?;
        }
        Ok(())
    }
}

impl Default for CodeGen {
    fn default() -> Self {
        Self::new()
    }
}

fn llvm_type(ty: Type) -> GenResult<&'static str> {
    match ty {
        Type::Integer => Ok("i32"),
        Type::Float => Ok("double"),
        Type::Boolean => Ok("i1"),
        Type::Char => Ok("i8"),
        Type::Void => Ok("void"),
        Type::String => Err(CodeGenError::UnsupportedString),
    }
}

fn zero_value(llvm_ty: &str) -> &'static str {
    match llvm_ty {
        "double" => "0x0000000000000000",
        _ => "0",
    }
}

/// Doubles print as exact bit patterns; always valid IR syntax
fn fmt_float(value: f64) -> String {
    format!("0x{:016X}", value.to_bits())
}

fn emit_literal(literal: &Literal) -> GenResult<Value> {
    match literal {
        Literal::Integer(v) => Ok(Value { text: v.to_string(), ty: "i32" }),
        Literal::Float(v) => Ok(Value { text: fmt_float(*v), ty: "double" }),
        Literal::Boolean(v) => Ok(Value {
            text: if *v { "1" } else { "0" }.to_string(),
            ty: "i1",
        }),
        Literal::Char(c) => Ok(Value {
            text: ((*c as u32 as u8) as i8).to_string(),
            ty: "i8",
        }),
        Literal::Str(_) => Err(CodeGenError::UnsupportedString),
    }
}

fn const_array_len(name: &str, size: Option<&Expr>) -> GenResult<i64> {
    match size.map(|e| &e.kind) {
        Some(ExprKind::Literal(Literal::Integer(len))) => Ok(*len),
        Some(_) => Err(CodeGenError::NonConstantArraySize(name.to_string())),
        None => Err(CodeGenError::MissingArraySize(name.to_string())),
    }
}

fn default_target_triple() -> String {
    #[cfg(target_os = "windows")]
    {
        "x86_64-pc-windows-msvc".to_string()
    }
    #[cfg(target_os = "macos")]
    {
        "x86_64-apple-darwin".to_string()
    }
    #[cfg(not(any(target_os = "windows", target_os = "macos")))]
    {
        "x86_64-unknown-linux-gnu".to_string()
    }
}
