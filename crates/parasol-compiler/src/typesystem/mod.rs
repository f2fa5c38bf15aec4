//! # 組み込み型レジストリ
//!
//! 型注釈に現れる名前から組み込み型を引く表です。後段の型検査が参照するもので、
//! フロントエンドはこの表を変更しません。

use std::collections::HashMap;
use std::fmt;

/// 型のID（登録順）
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TypeId(pub u32);

/// 組み込み型の種類
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TypeKind {
    /// 整数
    Int,
    /// 浮動小数点数
    Float,
    /// 浮動小数点数のベクトル（要素数）
    Vector(u8),
    /// 浮動小数点数の正方行列（次数）
    Matrix(u8),
}

/// 組み込み型
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Type {
    pub id: TypeId,
    pub name: String,
    pub kind: TypeKind,
}

impl Type {
    /// スカラー要素の数
    pub fn component_count(&self) -> usize {
        match self.kind {
            TypeKind::Int | TypeKind::Float => 1,
            TypeKind::Vector(n) => n as usize,
            TypeKind::Matrix(n) => (n as usize) * (n as usize),
        }
    }
}

impl fmt::Display for Type {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name)
    }
}

/// 型レジストリ
#[derive(Debug, Clone, Default)]
pub struct TypeRegistry {
    types: Vec<Type>,
    by_name: HashMap<String, TypeId>,
}

impl TypeRegistry {
    /// 組み込み型を登録したレジストリを作成
    pub fn with_builtins() -> Self {
        let mut registry = Self::default();
        registry.register("int", TypeKind::Int);
        registry.register("float", TypeKind::Float);
        registry.register("vec2", TypeKind::Vector(2));
        registry.register("vec3", TypeKind::Vector(3));
        registry.register("vec4", TypeKind::Vector(4));
        registry.register("mat4", TypeKind::Matrix(4));
        registry
    }

    fn register(&mut self, name: &str, kind: TypeKind) -> TypeId {
        let id = TypeId(self.types.len() as u32);
        self.types.push(Type {
            id,
            name: name.to_string(),
            kind,
        });
        self.by_name.insert(name.to_string(), id);
        id
    }

    /// 名前で型を検索
    pub fn lookup(&self, name: &str) -> Option<&Type> {
        self.by_name.get(name).map(|id| &self.types[id.0 as usize])
    }

    /// IDで型を取得
    pub fn get(&self, id: TypeId) -> Option<&Type> {
        self.types.get(id.0 as usize)
    }

    /// 登録された型の数
    pub fn len(&self) -> usize {
        self.types.len()
    }

    /// 空かどうか
    pub fn is_empty(&self) -> bool {
        self.types.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builtins_are_registered() {
        let registry = TypeRegistry::with_builtins();
        assert_eq!(registry.len(), 6);
        assert_eq!(registry.lookup("vec3").map(Type::component_count), Some(3));
        assert_eq!(registry.lookup("mat4").map(Type::component_count), Some(16));
        assert!(registry.lookup("vec5").is_none());
    }
}
