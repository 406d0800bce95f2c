//! Lexically scoped symbol table
//!
//! Scopes form a tree held in an arena: the parent link is an index, the
//! child list a vector of indices, so there is no cyclic ownership and the
//! tree can be walked uniformly for printing.

use crate::ast::Type;

/// Handle to a scope in the arena
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScopeId(usize);

/// What a name is bound to
#[derive(Debug, Clone, PartialEq)]
pub enum Symbol {
    Var { ty: Type },
    Array { elem: Type },
    VarParam { ty: Type },
    ArrayParam { elem: Type },
    Func { ret: Type, params: Vec<Type> },
}

impl Symbol {
    /// The declared type tag: element type for arrays, return type for
    /// functions. Conflict detection compares these.
    pub fn type_tag(&self) -> Type {
        match self {
            Symbol::Var { ty } | Symbol::VarParam { ty } => *ty,
            Symbol::Array { elem } | Symbol::ArrayParam { elem } => *elem,
            Symbol::Func { ret, .. } => *ret,
        }
    }

    fn kind_name(&self) -> &'static str {
        match self {
            Symbol::Var { .. } => "VarDecl",
            Symbol::Array { .. } => "ArrayDecl",
            Symbol::VarParam { .. } => "VarParam",
            Symbol::ArrayParam { .. } => "ArrayParam",
            Symbol::Func { .. } => "FuncDecl",
        }
    }
}

/// Raised by `add` when a name is already bound in the scope
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DefineError {
    /// Same name, different declared type tag
    Conflict,
    /// Same name, same declared type tag
    Defined,
}

#[derive(Debug)]
pub struct Scope {
    pub name: String,
    pub parent: Option<ScopeId>,
    pub children: Vec<ScopeId>,
    /// Bindings in insertion order
    entries: Vec<(String, Symbol)>,
    /// Set for scopes introduced by a function declaration
    pub is_function: bool,
    /// Meaningful on function scopes only
    pub has_return: bool,
}

/// Arena of scopes; index 0 is always the global scope
#[derive(Debug)]
pub struct SymbolTable {
    scopes: Vec<Scope>,
}

impl SymbolTable {
    pub const GLOBAL: ScopeId = ScopeId(0);

    pub fn new() -> Self {
        Self {
            scopes: vec![Scope {
                name: "global".to_string(),
                parent: None,
                children: Vec::new(),
                entries: Vec::new(),
                is_function: false,
                has_return: false,
            }],
        }
    }

    /// Create a child scope and register it with its parent
    pub fn new_scope(&mut self, name: impl Into<String>, parent: ScopeId) -> ScopeId {
        self.new_scope_inner(name.into(), parent, false)
    }

    /// Create a function scope; these carry the `has_return` indicator
    pub fn new_function_scope(&mut self, name: impl Into<String>, parent: ScopeId) -> ScopeId {
        self.new_scope_inner(name.into(), parent, true)
    }

    fn new_scope_inner(&mut self, name: String, parent: ScopeId, is_function: bool) -> ScopeId {
        let id = ScopeId(self.scopes.len());
        self.scopes.push(Scope {
            name,
            parent: Some(parent),
            children: Vec::new(),
            entries: Vec::new(),
            is_function,
            has_return: false,
        });
        self.scopes[parent.0].children.push(id);
        id
    }

    pub fn scope(&self, id: ScopeId) -> &Scope {
        &self.scopes[id.0]
    }

    /// Insert a binding into `scope`. Redeclaration within one scope is
    /// rejected; whether it is a conflict depends on the type tag.
    pub fn add(&mut self, scope: ScopeId, name: &str, symbol: Symbol) -> Result<(), DefineError> {
        let entries = &mut self.scopes[scope.0].entries;

        if let Some((_, existing)) = entries.iter().find(|(n, _)| n == name) {
            if existing.type_tag() != symbol.type_tag() {
                return Err(DefineError::Conflict);
            }
            return Err(DefineError::Defined);
        }

        entries.push((name.to_string(), symbol));
        Ok(())
    }

    /// Lexical lookup: the scope itself, then the parent chain
    pub fn get(&self, scope: ScopeId, name: &str) -> Option<&Symbol> {
        let mut current = Some(scope);
        while let Some(id) = current {
            let scope = &self.scopes[id.0];
            if let Some((_, symbol)) = scope.entries.iter().find(|(n, _)| n == name) {
                return Some(symbol);
            }
            current = scope.parent;
        }
        None
    }

    /// Nearest enclosing function scope, including `from` itself
    pub fn enclosing_function(&self, from: ScopeId) -> Option<ScopeId> {
        let mut current = Some(from);
        while let Some(id) = current {
            if self.scopes[id.0].is_function {
                return Some(id);
            }
            current = self.scopes[id.0].parent;
        }
        None
    }

    pub fn set_has_return(&mut self, scope: ScopeId) {
        self.scopes[scope.0].has_return = true;
    }

    fn fmt_scope(
        &self,
        f: &mut std::fmt::Formatter<'_>,
        id: ScopeId,
        depth: usize,
    ) -> std::fmt::Result {
        let scope = &self.scopes[id.0];
        let indent = "  ".repeat(depth);

        writeln!(f, "{indent}Symbol Table: '{}'", scope.name)?;
        for (name, symbol) in &scope.entries {
            writeln!(
                f,
                "{indent}  {name}: {}({})",
                symbol.kind_name(),
                symbol.type_tag()
            )?;
        }
        for child in &scope.children {
            self.fmt_scope(f, *child, depth + 1)?;
        }
        Ok(())
    }
}

impl Default for SymbolTable {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for SymbolTable {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.fmt_scope(f, Self::GLOBAL, 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_global_scope_exists() {
        let table = SymbolTable::new();
        assert_eq!(table.scope(SymbolTable::GLOBAL).name, "global");
        assert!(table.scope(SymbolTable::GLOBAL).parent.is_none());
    }

    #[test]
    fn test_add_and_get() {
        let mut table = SymbolTable::new();
        table
            .add(SymbolTable::GLOBAL, "x", Symbol::Var { ty: Type::Integer })
            .expect("fresh name");

        let symbol = table.get(SymbolTable::GLOBAL, "x").expect("bound");
        assert_eq!(symbol.type_tag(), Type::Integer);
    }

    #[test]
    fn test_redefinition_same_type() {
        let mut table = SymbolTable::new();
        table
            .add(SymbolTable::GLOBAL, "x", Symbol::Var { ty: Type::Integer })
            .expect("fresh name");
        let err = table
            .add(SymbolTable::GLOBAL, "x", Symbol::Var { ty: Type::Integer })
            .unwrap_err();
        assert_eq!(err, DefineError::Defined);
    }

    #[test]
    fn test_redefinition_different_type() {
        let mut table = SymbolTable::new();
        table
            .add(SymbolTable::GLOBAL, "x", Symbol::Var { ty: Type::Integer })
            .expect("fresh name");
        let err = table
            .add(SymbolTable::GLOBAL, "x", Symbol::Var { ty: Type::Float })
            .unwrap_err();
        assert_eq!(err, DefineError::Conflict);
    }

    #[test]
    fn test_lexical_lookup_walks_parents() {
        let mut table = SymbolTable::new();
        table
            .add(SymbolTable::GLOBAL, "x", Symbol::Var { ty: Type::Integer })
            .expect("fresh name");
        let inner = table.new_scope("if0", SymbolTable::GLOBAL);

        assert!(table.get(inner, "x").is_some());
        assert!(table.get(inner, "y").is_none());
    }

    #[test]
    fn test_inner_shadows_outer() {
        let mut table = SymbolTable::new();
        table
            .add(SymbolTable::GLOBAL, "x", Symbol::Var { ty: Type::Integer })
            .expect("fresh name");
        let inner = table.new_scope("while0", SymbolTable::GLOBAL);
        table
            .add(inner, "x", Symbol::Var { ty: Type::Float })
            .expect("shadowing in a child scope is allowed");

        assert_eq!(table.get(inner, "x").map(Symbol::type_tag), Some(Type::Float));
        assert_eq!(
            table.get(SymbolTable::GLOBAL, "x").map(Symbol::type_tag),
            Some(Type::Integer)
        );
    }

    #[test]
    fn test_children_recorded_in_order() {
        let mut table = SymbolTable::new();
        let a = table.new_scope("if0", SymbolTable::GLOBAL);
        let b = table.new_scope("while0", SymbolTable::GLOBAL);
        assert_eq!(table.scope(SymbolTable::GLOBAL).children, vec![a, b]);
    }

    #[test]
    fn test_enclosing_function() {
        let mut table = SymbolTable::new();
        let func = table.new_function_scope("main", SymbolTable::GLOBAL);
        let block = table.new_scope("if0", func);

        assert_eq!(table.enclosing_function(block), Some(func));
        assert_eq!(table.enclosing_function(func), Some(func));
        assert_eq!(table.enclosing_function(SymbolTable::GLOBAL), None);
    }

    #[test]
    fn test_has_return_flag() {
        let mut table = SymbolTable::new();
        let func = table.new_function_scope("main", SymbolTable::GLOBAL);
        assert!(!table.scope(func).has_return);
        table.set_has_return(func);
        assert!(table.scope(func).has_return);
    }

    #[test]
    fn test_display_tree() {
        let mut table = SymbolTable::new();
        table
            .add(SymbolTable::GLOBAL, "x", Symbol::Var { ty: Type::Integer })
            .expect("fresh name");
        let func = table.new_function_scope("main", SymbolTable::GLOBAL);
        table
            .add(func, "n", Symbol::VarParam { ty: Type::Integer })
            .expect("fresh name");

        let printed = format!("{table}");
        assert!(printed.contains("Symbol Table: 'global'"));
        assert!(printed.contains("x: VarDecl(integer)"));
        assert!(printed.contains("Symbol Table: 'main'"));
        assert!(printed.contains("n: VarParam(integer)"));
    }

    #[test]
    fn test_func_symbol_params() {
        let mut table = SymbolTable::new();
        table
            .add(
                SymbolTable::GLOBAL,
                "f",
                Symbol::Func {
                    ret: Type::Integer,
                    params: vec![Type::Integer, Type::Float],
                },
            )
            .expect("fresh name");

        match table.get(SymbolTable::GLOBAL, "f") {
            Some(Symbol::Func { ret, params }) => {
                assert_eq!(*ret, Type::Integer);
                assert_eq!(params.len(), 2);
            }
            other => panic!("expected function symbol, got {other:?}"),
        }
    }
}
