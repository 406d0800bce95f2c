//! AST rendering as Graphviz DOT source

use super::{Decl, DeclKind, Expr, ExprKind, Param, ParamKind, Program, Stmt, StmtKind};

/// Render a program as DOT source for the `--dot` mode
pub fn render(program: &Program) -> String {
    let mut printer = DotPrinter::new();
    let root = printer.node("Program", BOX_STYLE);

    for decl in &program.decls {
        let child = printer.decl(decl);
        printer.edge(&root, &child);
    }

    printer.finish()
}

const BOX_STYLE: &str = "shape=box, color=deepskyblue, style=filled";
const OPER_STYLE: &str = "shape=circle, color=dodgerblue, style=filled";
const LITERAL_STYLE: &str = "shape=box, color=darksalmon, style=filled";
const BLOCK_STYLE: &str = "shape=box, color=lightgrey, style=filled";

struct DotPrinter {
    out: String,
    seq: usize,
}

impl DotPrinter {
    fn new() -> Self {
        let mut out = String::from("digraph AST {\n");
        out.push_str("  edge [arrowhead=none]\n");
        Self { out, seq: 0 }
    }

    fn finish(mut self) -> String {
        self.out.push_str("}\n");
        self.out
    }

    fn node(&mut self, label: &str, style: &str) -> String {
        self.seq += 1;
        let name = format!("n{:02}", self.seq);
        self.out
            .push_str(&format!("  {name} [label=\"{}\", {style}]\n", escape(label)));
        name
    }

    fn edge(&mut self, from: &str, to: &str) {
        self.out.push_str(&format!("  {from} -> {to}\n"));
    }

    fn decl(&mut self, decl: &Decl) -> String {
        match &decl.kind {
            DeclKind::Var { name, ty, init } => {
                let node = self.node(&format!("VarDecl: {name}"), BOX_STYLE);
                let ty_node = self.node(&format!("Type: {ty}"), BOX_STYLE);
                self.edge(&node, &ty_node);
                if let Some(init) = init {
                    let value = self.expr(init);
                    self.edge(&node, &value);
                }
                node
            }
            DeclKind::Array { name, elem, size, init } => {
                let node = self.node(&format!("ArrayDecl: {name}"), BOX_STYLE);
                let ty_node = self.node(&format!("Type: {elem}"), BOX_STYLE);
                self.edge(&node, &ty_node);
                if let Some(size) = size {
                    let size_node = self.expr(size);
                    self.edge(&node, &size_node);
                }
                for value in init.iter().flatten() {
                    let value_node = self.expr(value);
                    self.edge(&node, &value_node);
                }
                node
            }
            DeclKind::Func { name, ret, params, body } => {
                let node = self.node(&format!("FuncDecl: {name}"), BOX_STYLE);
                let ty_node = self.node(&format!("Type: {ret}"), BOX_STYLE);
                self.edge(&node, &ty_node);
                for param in params {
                    let param_node = self.param(param);
                    self.edge(&node, &param_node);
                }
                for stmt in body.iter().flatten() {
                    let stmt_node = self.stmt(stmt);
                    self.edge(&node, &stmt_node);
                }
                node
            }
        }
    }

    fn param(&mut self, param: &Param) -> String {
        let node = self.node(&param.name, BOX_STYLE);
        let ty_node = self.node(&format!("Type: {}", param.ty), BOX_STYLE);
        self.edge(&node, &ty_node);
        if let ParamKind::Array { size: Some(size) } = &param.kind {
            let size_node = self.expr(size);
            self.edge(&node, &size_node);
        }
        node
    }

    fn stmt(&mut self, stmt: &Stmt) -> String {
        match &stmt.kind {
            StmtKind::If { cond, then_branch, else_branch } => {
                let node = self.node("IfStmt", BOX_STYLE);
                if let Some(cond) = cond {
                    let cond_node = self.expr(cond);
                    self.edge(&node, &cond_node);
                }
                let then_node = self.stmt(then_branch);
                self.edge(&node, &then_node);
                if let Some(else_branch) = else_branch {
                    let else_node = self.stmt(else_branch);
                    self.edge(&node, &else_node);
                }
                node
            }
            StmtKind::While { cond, body } => {
                let node = self.node("WhileStmt", BOX_STYLE);
                if let Some(cond) = cond {
                    let cond_node = self.expr(cond);
                    self.edge(&node, &cond_node);
                }
                let body_node = self.stmt(body);
                self.edge(&node, &body_node);
                node
            }
            StmtKind::DoWhile { body, cond } => {
                let node = self.node("DoWhileStmt", BOX_STYLE);
                let body_node = self.stmt(body);
                self.edge(&node, &body_node);
                if let Some(cond) = cond {
                    let cond_node = self.expr(cond);
                    self.edge(&node, &cond_node);
                }
                node
            }
            StmtKind::For { init, cond, incr, body } => {
                let node = self.node("ForStmt", BOX_STYLE);
                for part in [init, cond, incr].into_iter().flatten() {
                    let part_node = self.expr(part);
                    self.edge(&node, &part_node);
                }
                let body_node = self.stmt(body);
                self.edge(&node, &body_node);
                node
            }
            StmtKind::Return { value } => {
                let node = self.node("ReturnStmt", BOX_STYLE);
                if let Some(value) = value {
                    let value_node = self.expr(value);
                    self.edge(&node, &value_node);
                }
                node
            }
            StmtKind::Print { args } => {
                let node = self.node("PrintStmt", BOX_STYLE);
                for arg in args {
                    let arg_node = self.expr(arg);
                    self.edge(&node, &arg_node);
                }
                node
            }
            StmtKind::Block { body } => {
                let node = self.node("BlockStmt", BLOCK_STYLE);
                for stmt in body {
                    let stmt_node = self.stmt(stmt);
                    self.edge(&node, &stmt_node);
                }
                node
            }
            StmtKind::Decl(decl) => self.decl(decl),
            StmtKind::Expr(expr) => self.expr(expr),
        }
    }

    fn expr(&mut self, expr: &Expr) -> String {
        match &expr.kind {
            ExprKind::Literal(literal) => {
                let ty = expr
                    .ty
                    .map(|t| t.to_string())
                    .unwrap_or_else(|| "?".to_string());
                let node = self.node("Literal", LITERAL_STYLE);
                let ty_node = self.node(&format!("Type: {ty}"), BOX_STYLE);
                let value_node = self.node(&literal.to_string(), BOX_STYLE);
                self.edge(&node, &ty_node);
                self.edge(&node, &value_node);
                node
            }
            ExprKind::Var { name } => self.node(&format!("VarLoc: {name}"), BOX_STYLE),
            ExprKind::Index { name, index } => {
                let node = self.node(&format!("ArrayLoc: {name}"), BOX_STYLE);
                let index_node = self.expr(index);
                self.edge(&node, &index_node);
                node
            }
            ExprKind::Call { name, args } => {
                let node = self.node(&format!("FuncCall: {name}"), BOX_STYLE);
                for arg in args {
                    let arg_node = self.expr(arg);
                    self.edge(&node, &arg_node);
                }
                node
            }
            ExprKind::Binary { op, left, right } => {
                let node = self.node(&op.to_string(), OPER_STYLE);
                let left_node = self.expr(left);
                let right_node = self.expr(right);
                self.edge(&node, &left_node);
                self.edge(&node, &right_node);
                node
            }
            ExprKind::Unary { op, expr: operand, .. } => {
                let node = self.node(&op.to_string(), OPER_STYLE);
                let operand_node = self.expr(operand);
                self.edge(&node, &operand_node);
                node
            }
            ExprKind::Assign { target, value } => {
                let node = self.node("Assignment", BOX_STYLE);
                let target_node = self.expr(target);
                let value_node = self.expr(value);
                self.edge(&node, &target_node);
                self.edge(&node, &value_node);
                node
            }
        }
    }
}

fn escape(label: &str) -> String {
    label
        .replace('\\', "\\\\")
        .replace('"', "\\\"")
        .replace('\n', "\\\\n")
}
