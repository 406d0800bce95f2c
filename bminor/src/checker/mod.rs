//! Semantic analysis
//!
//! A single walk over the tree resolves names against a scope tree, stamps
//! every expression with its type tag, and validates declarations, calls,
//! conditions, and return paths. Errors accumulate; checking never stops
//! early.

use crate::ast::{
    BinOp, Decl, DeclKind, Expr, ExprKind, Param, ParamKind, Program, Stmt, StmtKind, Type,
};
use crate::error::{Diagnostics, ErrorKind};
use crate::symtab::{DefineError, ScopeId, Symbol, SymbolTable};
use crate::types::{check_binop, check_unaryop};

pub struct Checker<'a> {
    diagnostics: &'a mut Diagnostics,
    table: SymbolTable,
    current: ScopeId,
    if_counter: usize,
    while_counter: usize,
    do_while_counter: usize,
    for_counter: usize,
}

impl<'a> Checker<'a> {
    /// Check a program, producing the scope tree. Inferred types are
    /// written into the expression nodes.
    pub fn check(program: &mut Program, diagnostics: &'a mut Diagnostics) -> SymbolTable {
        let mut checker = Checker {
            diagnostics,
            table: SymbolTable::new(),
            current: SymbolTable::GLOBAL,
            if_counter: 0,
            while_counter: 0,
            do_while_counter: 0,
            for_counter: 0,
        };

        for decl in &mut program.decls {
            checker.check_decl(decl);
        }

        checker.table
    }

    fn error(&mut self, lineno: usize, message: String) {
        self.diagnostics.error(ErrorKind::Semantic, lineno, message);
    }

    fn declare(&mut self, name: &str, symbol: Symbol, lineno: usize) {
        match self.table.add(self.current, name, symbol) {
            Ok(()) => {}
            Err(DefineError::Conflict) => self.error(
                lineno,
                format!("'{name}' has already been declared with a different type"),
            ),
            Err(DefineError::Defined) => {
                self.error(lineno, format!("'{name}' has already been declared"))
            }
        }
    }

    fn check_decl(&mut self, decl: &mut Decl) {
        let lineno = decl.lineno;

        match &mut decl.kind {
            DeclKind::Var { name, ty, init } => {
                if let Some(init) = init {
                    self.check_expr(init);
                    if let Some(value_ty) = init.ty {
                        if check_binop(BinOp::Assign, *ty, value_ty).is_none() {
                            self.error(lineno, format!("Types do not match in '{name}'"));
                        }
                    }
                }
                let symbol = Symbol::Var { ty: *ty };
                self.declare(name, symbol, lineno);
            }

            DeclKind::Array { name, elem, size, init } => {
                match size {
                    Some(size) => {
                        self.check_expr(size);
                        if let Some(size_ty) = size.ty {
                            if size_ty != Type::Integer {
                                self.error(lineno, format!("Size of '{name}' must be an integer"));
                            }
                        }
                    }
                    None => self.error(lineno, format!("'{name}' must have size")),
                }

                if let Some(init) = init {
                    for value in init.iter_mut() {
                        self.check_expr(value);
                        if let Some(value_ty) = value.ty {
                            if value_ty != *elem {
                                self.error(
                                    lineno,
                                    format!("All elements of '{name}' must be '{elem}'"),
                                );
                                break;
                            }
                        }
                    }
                }

                let symbol = Symbol::Array { elem: *elem };
                self.declare(name, symbol, lineno);
            }

            DeclKind::Func { name, ret, params, body } => {
                let symbol = Symbol::Func {
                    ret: *ret,
                    params: params.iter().map(|p| p.ty).collect(),
                };
                self.declare(name, symbol, lineno);

                let func_scope = self.table.new_function_scope(name.clone(), self.current);
                let saved = self.current;
                self.current = func_scope;

                for param in params.iter_mut() {
                    self.check_param(param);
                }

                if let Some(body) = body {
                    for stmt in body.iter_mut() {
                        self.check_stmt(stmt);
                    }

                    if !body.is_empty()
                        && *ret != Type::Void
                        && !self.table.scope(func_scope).has_return
                    {
                        self.error(lineno, format!("'{name}' must have a return"));
                    }
                }

                self.current = saved;
            }
        }
    }

    fn check_param(&mut self, param: &mut Param) {
        let lineno = param.lineno;
        let ty = param.ty;

        match &mut param.kind {
            ParamKind::Value => {
                let symbol = Symbol::VarParam { ty };
                self.declare(&param.name, symbol, lineno);
            }
            ParamKind::Array { size } => {
                if let Some(size) = size {
                    self.check_expr(size);
                    if let Some(size_ty) = size.ty {
                        if size_ty != Type::Integer {
                            self.error(
                                lineno,
                                format!("Size of '{}' must be an integer", param.name),
                            );
                        }
                    }
                }
                let symbol = Symbol::ArrayParam { elem: ty };
                self.declare(&param.name, symbol, lineno);
            }
        }
    }

    fn check_stmt(&mut self, stmt: &mut Stmt) {
        let lineno = stmt.lineno;

        match &mut stmt.kind {
            StmtKind::If { cond, then_branch, else_branch } => {
                let name = format!("if{}", self.if_counter);
                self.check_condition(cond, lineno, "if");

                let then_scope = self.table.new_scope(name.clone(), self.current);
                self.if_counter += 1;

                let saved = self.current;
                self.current = then_scope;
                self.check_stmt(then_branch);
                self.current = saved;

                if let Some(else_branch) = else_branch {
                    let else_scope = self.table.new_scope(format!("{name}else"), saved);
                    self.current = else_scope;
                    self.check_stmt(else_branch);
                    self.current = saved;
                }
            }

            StmtKind::While { cond, body } => {
                let name = format!("while{}", self.while_counter);
                self.check_condition(cond, lineno, "while");

                let scope = self.table.new_scope(name, self.current);
                self.while_counter += 1;

                let saved = self.current;
                self.current = scope;
                self.check_stmt(body);
                self.current = saved;
            }

            StmtKind::DoWhile { body, cond } => {
                let name = format!("do_while{}", self.do_while_counter);
                self.check_condition(cond, lineno, "do-while");

                let scope = self.table.new_scope(name, self.current);
                self.do_while_counter += 1;

                let saved = self.current;
                self.current = scope;
                self.check_stmt(body);
                self.current = saved;
            }

            StmtKind::For { init, cond, incr, body } => {
                let name = format!("for{}", self.for_counter);

                match init {
                    Some(init) => self.check_expr(init),
                    None => {
                        self.error(lineno, "'for' must have a variable initialization".to_string())
                    }
                }

                self.check_condition(cond, lineno, "for");

                match incr {
                    Some(incr) => self.check_expr(incr),
                    None => self.error(
                        lineno,
                        "'for' must have a variable increment or decrement".to_string(),
                    ),
                }

                let scope = self.table.new_scope(name, self.current);
                self.for_counter += 1;

                let saved = self.current;
                self.current = scope;
                self.check_stmt(body);
                self.current = saved;
            }

            StmtKind::Return { value } => {
                let func_scope = self.table.enclosing_function(self.current);
                if let Some(scope) = func_scope {
                    self.table.set_has_return(scope);
                }

                if let Some(value) = value {
                    self.check_expr(value);

                    if let (Some(scope), Some(value_ty)) = (func_scope, value.ty) {
                        let func_name = self.table.scope(scope).name.clone();
                        let ret = match self.table.get(scope, &func_name) {
                            Some(Symbol::Func { ret, .. }) => Some(*ret),
                            _ => None,
                        };
                        if let Some(ret) = ret {
                            if ret != value_ty {
                                self.error(
                                    lineno,
                                    format!("'{func_name}' returns a different type"),
                                );
                            }
                        }
                    }
                }
            }

            StmtKind::Print { args } => {
                for arg in args.iter_mut() {
                    self.check_expr(arg);
                }
            }

            StmtKind::Block { body } => {
                for stmt in body.iter_mut() {
                    self.check_stmt(stmt);
                }
            }

            StmtKind::Decl(decl) => self.check_decl(decl),

            StmtKind::Expr(expr) => self.check_expr(expr),
        }
    }

    fn check_condition(&mut self, cond: &mut Option<Expr>, lineno: usize, kind: &str) {
        match cond {
            Some(cond) => {
                self.check_expr(cond);
                if let Some(cond_ty) = cond.ty {
                    if cond_ty != Type::Boolean {
                        self.error(lineno, format!("Condition in '{kind}' must be boolean"));
                    }
                }
            }
            None => self.error(lineno, format!("'{kind}' must have a boolean condition")),
        }
    }

    fn check_expr(&mut self, expr: &mut Expr) {
        let lineno = expr.lineno;

        match &mut expr.kind {
            // literals arrive typed from the parser
            ExprKind::Literal(_) => {}

            ExprKind::Var { name } => {
                let ty = self.table.get(self.current, name).map(Symbol::type_tag);
                match ty {
                    Some(ty) => expr.ty = Some(ty),
                    None => {
                        let message = format!("'{name}' is not defined");
                        self.error(lineno, message);
                    }
                }
            }

            ExprKind::Index { name, index } => {
                let ty = self.table.get(self.current, name).map(Symbol::type_tag);
                match ty {
                    Some(ty) => expr.ty = Some(ty),
                    None => {
                        let message = format!("'{name}' is not defined");
                        self.error(lineno, message);
                        return;
                    }
                }

                self.check_expr(index);
                if let Some(index_ty) = index.ty {
                    if index_ty != Type::Integer {
                        let message = format!("'{name}' index must be an integer");
                        self.error(lineno, message);
                    }
                }
            }

            ExprKind::Call { name, args } => {
                let symbol = self.table.get(self.current, name).cloned();
                match symbol {
                    None => {
                        let message = format!("'{name}' is not defined");
                        self.error(lineno, message);
                    }
                    Some(Symbol::Func { ret, params }) => {
                        if args.len() != params.len() {
                            let message = format!("Wrong arguments in '{name}'");
                            self.error(lineno, message);
                            return;
                        }

                        expr.ty = Some(ret);

                        for arg in args.iter_mut() {
                            self.check_expr(arg);
                        }

                        for (arg, param_ty) in args.iter().zip(params.iter()) {
                            if let Some(arg_ty) = arg.ty {
                                if arg_ty != *param_ty {
                                    let message =
                                        format!("Types do not match in '{name}' arguments");
                                    self.error(lineno, message);
                                    return;
                                }
                            }
                        }
                    }
                    Some(_) => {
                        let message = format!("'{name}' is not a function");
                        self.error(lineno, message);
                    }
                }
            }

            ExprKind::Binary { op, left, right } => {
                let op = *op;
                self.check_expr(left);
                self.check_expr(right);

                if let (Some(left_ty), Some(right_ty)) = (left.ty, right.ty) {
                    let result = check_binop(op, left_ty, right_ty);
                    expr.ty = result;
                    if result.is_none() {
                        self.error(lineno, format!("Types do not match in '{op}'"));
                    }
                }
            }

            ExprKind::Unary { op, expr: operand, .. } => {
                let op = *op;
                self.check_expr(operand);

                if let Some(operand_ty) = operand.ty {
                    let result = check_unaryop(op, operand_ty);
                    expr.ty = result;
                    if result.is_none() {
                        self.error(lineno, format!("Types do not match in '{op}'"));
                    }
                }
            }

            ExprKind::Assign { target, value } => {
                self.check_expr(target);
                self.check_expr(value);

                if let (Some(target_ty), Some(value_ty)) = (target.ty, value.ty) {
                    if target_ty != value_ty {
                        let name = target.kind.loc_name().unwrap_or_default().to_string();
                        self.error(lineno, format!("Types do not match in {name}"));
                    } else {
                        expr.ty = Some(value_ty);
                    }
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lexer::tokenize;
    use crate::parser::parse;

    fn check_source(source: &str) -> (Program, SymbolTable, Diagnostics) {
        let mut diagnostics = Diagnostics::new();
        let tokens = tokenize(source, &mut diagnostics);
        let mut program = parse(tokens, &mut diagnostics);
        assert_eq!(diagnostics.count(), 0, "setup must parse cleanly: {source}");
        let table = Checker::check(&mut program, &mut diagnostics);
        (program, table, diagnostics)
    }

    fn messages(diagnostics: &Diagnostics) -> Vec<String> {
        diagnostics.iter().map(|d| d.message.clone()).collect()
    }

    #[test]
    fn test_clean_program() {
        let (_, _, diagnostics) = check_source(
            "x: integer = 1;\n\
             main: function integer () = { return x; };",
        );
        assert_eq!(diagnostics.count(), 0);
    }

    #[test]
    fn test_var_decl_type_mismatch() {
        let (_, _, diagnostics) = check_source("a: integer = 1; b: float = a;");
        assert_eq!(diagnostics.count(), 1);
        assert_eq!(messages(&diagnostics)[0], "Types do not match in 'b'");
    }

    #[test]
    fn test_non_boolean_if_condition() {
        let (_, _, diagnostics) =
            check_source("f: function void (x: integer) = { if (x) { return; } };");
        assert_eq!(diagnostics.count(), 1);
        assert_eq!(messages(&diagnostics)[0], "Condition in 'if' must be boolean");
    }

    #[test]
    fn test_undefined_variable() {
        let (_, _, diagnostics) = check_source("f: function void () = { print y; };");
        assert_eq!(messages(&diagnostics), vec!["'y' is not defined"]);
    }

    #[test]
    fn test_duplicate_declaration() {
        let (_, _, diagnostics) = check_source("x: integer; x: integer;");
        assert_eq!(messages(&diagnostics), vec!["'x' has already been declared"]);
    }

    #[test]
    fn test_conflicting_declaration() {
        let (_, _, diagnostics) = check_source("x: integer; x: float;");
        assert_eq!(
            messages(&diagnostics),
            vec!["'x' has already been declared with a different type"]
        );
    }

    #[test]
    fn test_shadowing_in_inner_scope_is_allowed() {
        let (_, _, diagnostics) = check_source(
            "x: integer = 1;\n\
             f: function void () = { if (true) { x: float = 1.5; } };",
        );
        assert_eq!(diagnostics.count(), 0);
    }

    #[test]
    fn test_call_is_annotated_with_return_type() {
        let (program, _, diagnostics) = check_source(
            "my_func: function integer (x: integer) = { return 1; };\n\
             r: integer = my_func(2);",
        );
        assert_eq!(diagnostics.count(), 0);

        match &program.decls[1].kind {
            DeclKind::Var { init: Some(init), .. } => {
                assert!(matches!(init.kind, ExprKind::Call { .. }));
                assert_eq!(init.ty, Some(Type::Integer));
            }
            other => panic!("expected VarDecl, got {other:?}"),
        }
    }

    #[test]
    fn test_call_arity_mismatch() {
        let (_, _, diagnostics) = check_source(
            "f: function integer (x: integer) = { return x; };\n\
             r: integer = f(1, 2);",
        );
        assert_eq!(messages(&diagnostics), vec!["Wrong arguments in 'f'"]);
    }

    #[test]
    fn test_call_argument_type_mismatch() {
        let (_, _, diagnostics) = check_source(
            "f: function integer (x: integer) = { return x; };\n\
             r: integer = f(1.5);",
        );
        assert_eq!(
            messages(&diagnostics),
            vec!["Types do not match in 'f' arguments"]
        );
    }

    #[test]
    fn test_call_of_non_function() {
        let (_, _, diagnostics) = check_source(
            "x: integer = 1;\n\
             f: function void () = { x(); };",
        );
        assert_eq!(messages(&diagnostics), vec!["'x' is not a function"]);
    }

    #[test]
    fn test_missing_return() {
        let (_, _, diagnostics) = check_source("f: function integer () = { print 1; };");
        assert_eq!(messages(&diagnostics), vec!["'f' must have a return"]);
    }

    #[test]
    fn test_missing_return_not_required_for_void() {
        let (_, _, diagnostics) = check_source("f: function void () = { print 1; };");
        assert_eq!(diagnostics.count(), 0);
    }

    #[test]
    fn test_missing_return_not_required_for_forward_decl() {
        let (_, _, diagnostics) = check_source("f: function integer (x: integer);");
        assert_eq!(diagnostics.count(), 0);
    }

    #[test]
    fn test_return_type_mismatch() {
        let (_, _, diagnostics) = check_source("f: function integer () = { return 1.5; };");
        assert_eq!(messages(&diagnostics), vec!["'f' returns a different type"]);
    }

    #[test]
    fn test_return_from_nested_block_sets_has_return() {
        let (_, _, diagnostics) = check_source(
            "f: function integer (x: boolean) = { if (x) { return 1; } else { return 2; } };",
        );
        assert_eq!(diagnostics.count(), 0);
    }

    #[test]
    fn test_assignment_type_mismatch() {
        let (_, _, diagnostics) = check_source(
            "x: integer;\n\
             f: function void () = { x = 1.5; };",
        );
        assert_eq!(messages(&diagnostics), vec!["Types do not match in x"]);
    }

    #[test]
    fn test_assignment_to_undefined() {
        let (_, _, diagnostics) = check_source("f: function void () = { y = 1; };");
        assert_eq!(messages(&diagnostics)[0], "'y' is not defined");
    }

    #[test]
    fn test_binop_type_mismatch() {
        let (_, _, diagnostics) = check_source("r: integer = 1 + 1.5;");
        assert_eq!(messages(&diagnostics)[0], "Types do not match in '+'");
    }

    #[test]
    fn test_pow_always_mismatches() {
        let (_, _, diagnostics) = check_source("r: integer = 2 ^ 3;");
        assert_eq!(messages(&diagnostics)[0], "Types do not match in '^'");
    }

    #[test]
    fn test_char_arithmetic_rejected() {
        let (_, _, diagnostics) = check_source("c: char = 'a'; r: char = c; f: function void () = { print c + c; };");
        assert_eq!(messages(&diagnostics), vec!["Types do not match in '+'"]);
    }

    #[test]
    fn test_array_size_must_be_integer() {
        let (_, _, diagnostics) = check_source("a: array [1.5] integer;");
        assert_eq!(
            messages(&diagnostics),
            vec!["Size of 'a' must be an integer"]
        );
    }

    #[test]
    fn test_array_without_size() {
        let (_, _, diagnostics) = check_source("a: array [] integer;");
        assert_eq!(messages(&diagnostics), vec!["'a' must have size"]);
    }

    #[test]
    fn test_array_element_type_mismatch() {
        let (_, _, diagnostics) = check_source("a: array [2] integer = { 1, 2.5 };");
        assert_eq!(
            messages(&diagnostics),
            vec!["All elements of 'a' must be 'integer'"]
        );
    }

    #[test]
    fn test_array_index_must_be_integer() {
        let (_, _, diagnostics) = check_source(
            "a: array [3] integer;\n\
             f: function void () = { print a[1.5]; };",
        );
        assert_eq!(
            messages(&diagnostics),
            vec!["'a' index must be an integer"]
        );
    }

    #[test]
    fn test_for_requires_all_header_parts() {
        let (_, _, diagnostics) = check_source("f: function void () = { for (;;) return; };");
        let found = messages(&diagnostics);
        assert!(found.contains(&"'for' must have a variable initialization".to_string()));
        assert!(found.contains(&"'for' must have a boolean condition".to_string()));
        assert!(found.contains(&"'for' must have a variable increment or decrement".to_string()));
    }

    #[test]
    fn test_for_condition_must_be_boolean() {
        let (_, _, diagnostics) = check_source(
            "i: integer;\n\
             f: function void () = { for (i = 0; i + 1; i++) print i; };",
        );
        assert_eq!(
            messages(&diagnostics),
            vec!["Condition in 'for' must be boolean"]
        );
    }

    #[test]
    fn test_while_condition_must_be_boolean() {
        let (_, _, diagnostics) = check_source("f: function void () = { while (1) return; };");
        assert_eq!(
            messages(&diagnostics),
            vec!["Condition in 'while' must be boolean"]
        );
    }

    #[test]
    fn test_do_while_condition_must_be_boolean() {
        let (_, _, diagnostics) =
            check_source("f: function void () = { do return; while (1) };");
        assert_eq!(
            messages(&diagnostics),
            vec!["Condition in 'do-while' must be boolean"]
        );
    }

    #[test]
    fn test_increment_is_integer_typed() {
        let (_, _, diagnostics) = check_source(
            "i: integer;\n\
             f: function void () = { i++; };",
        );
        assert_eq!(diagnostics.count(), 0);
    }

    #[test]
    fn test_increment_of_float_rejected() {
        let (_, _, diagnostics) = check_source(
            "x: float;\n\
             f: function void () = { x++; };",
        );
        assert_eq!(messages(&diagnostics), vec!["Types do not match in '++'"]);
    }

    #[test]
    fn test_scope_names() {
        let (_, table, diagnostics) = check_source(
            "main: function void (b: boolean) = {\n\
               if (b) { print 1; } else { print 2; }\n\
               while (b) print 3;\n\
               do print 4; while (b)\n\
               i: integer;\n\
               for (i = 0; b; i++) print i;\n\
             };",
        );
        assert_eq!(diagnostics.count(), 0);

        let printed = format!("{table}");
        assert!(printed.contains("Symbol Table: 'global'"));
        assert!(printed.contains("Symbol Table: 'main'"));
        assert!(printed.contains("Symbol Table: 'if0'"));
        assert!(printed.contains("Symbol Table: 'if0else'"));
        assert!(printed.contains("Symbol Table: 'while0'"));
        assert!(printed.contains("Symbol Table: 'do_while0'"));
        assert!(printed.contains("Symbol Table: 'for0'"));
    }

    #[test]
    fn test_scope_counters_are_monotonic() {
        let (_, table, _) = check_source(
            "f: function void (b: boolean) = { if (b) print 1; if (b) print 2; };",
        );
        let printed = format!("{table}");
        assert!(printed.contains("'if0'"));
        assert!(printed.contains("'if1'"));
    }

    #[test]
    fn test_every_expression_is_typed_after_clean_check() {
        let (program, _, diagnostics) = check_source(
            "x: integer = 1;\n\
             f: function integer (y: integer) = { return x + y; };",
        );
        assert_eq!(diagnostics.count(), 0);

        match &program.decls[1].kind {
            DeclKind::Func { body: Some(body), .. } => match &body[0].kind {
                StmtKind::Return { value: Some(value) } => {
                    assert_eq!(value.ty, Some(Type::Integer));
                    match &value.kind {
                        ExprKind::Binary { left, right, .. } => {
                            assert_eq!(left.ty, Some(Type::Integer));
                            assert_eq!(right.ty, Some(Type::Integer));
                        }
                        other => panic!("expected BinOp, got {other:?}"),
                    }
                }
                other => panic!("expected ReturnStmt, got {other:?}"),
            },
            other => panic!("expected FuncDecl, got {other:?}"),
        }
    }

    #[test]
    fn test_checking_continues_after_errors() {
        let (_, _, diagnostics) = check_source(
            "f: function void () = { print y; print z; };",
        );
        assert_eq!(diagnostics.count(), 2);
    }
}
