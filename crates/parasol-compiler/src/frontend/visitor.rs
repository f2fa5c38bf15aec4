//! # 木の走査
//!
//! [`NodeKind::children`](crate::frontend::ast::NodeKind::children) による子ノードの列挙を使った
//! 汎用的な前順走査を提供します。ID付与、インクルード解決の走査、外部エクスポートが共通で使います。

use crate::frontend::ast::{Ast, NodeRef};

/// 直下の子ノードそれぞれに `visit` を適用する（型を区別しない走査）
pub fn apply_visitor<F>(ast: &Ast, root: NodeRef, mut visit: F)
where
    F: FnMut(NodeRef),
{
    for child in ast.children(root) {
        visit(child);
    }
}

/// 自分自身を訪問してから子ノードを訪問する走査のビジター
pub trait TypedVisitor {
    /// ノードに入ったときに呼ばれる
    fn visit(&mut self, ast: &Ast, node: NodeRef);

    /// ノードの子孫をすべて訪問し終えたときに呼ばれる
    fn leave(&mut self, _ast: &Ast, _node: NodeRef) {}
}

/// 明示スタック上の走査手順
enum Step {
    Enter(NodeRef),
    Leave(NodeRef),
}

/// `root` 以下を前順に走査する
///
/// 木の深さに関係なく呼び出しスタックを消費しません。
pub fn apply_typed_visitor<V>(visitor: &mut V, ast: &Ast, root: NodeRef)
where
    V: TypedVisitor + ?Sized,
{
    let mut stack = vec![Step::Enter(root)];

    while let Some(step) = stack.pop() {
        match step {
            Step::Enter(node) => {
                visitor.visit(ast, node);
                stack.push(Step::Leave(node));
                stack.extend(ast.children(node).into_iter().rev().map(Step::Enter));
            }
            Step::Leave(node) => visitor.leave(ast, node),
        }
    }
}

/// `root` 以下の全ノードを前順で返す
pub fn preorder(ast: &Ast, root: NodeRef) -> Vec<NodeRef> {
    struct Collect(Vec<NodeRef>);

    impl TypedVisitor for Collect {
        fn visit(&mut self, _ast: &Ast, node: NodeRef) {
            self.0.push(node);
        }
    }

    let mut collect = Collect(Vec::new());
    apply_typed_visitor(&mut collect, ast, root);
    collect.0
}

/// ノードIDを前順で付与するビジター
#[derive(Debug)]
pub struct IdVisitor {
    next_id: usize,
}

impl Default for IdVisitor {
    fn default() -> Self {
        Self { next_id: 1 }
    }
}

impl IdVisitor {
    /// 1から採番するビジターを作成
    pub fn new() -> Self {
        Self::default()
    }

    /// `root` 以下のノードにIDを付与する
    pub fn assign(&mut self, ast: &mut Ast, root: NodeRef) {
        let mut stack = vec![root];

        while let Some(node) = stack.pop() {
            ast.node_mut(node).node_id = self.next_id;
            self.next_id += 1;

            let mut children = Vec::new();
            apply_visitor(ast, node, |child| children.push(child));
            stack.extend(children.into_iter().rev());
        }
    }

    /// 次に付与されるID
    pub fn next_id(&self) -> usize {
        self.next_id
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::frontend::ast::NodeKind;
    use crate::frontend::lexer::TokenKind;

    fn small_tree() -> (Ast, NodeRef) {
        let mut ast = Ast::new();
        let one = ast.alloc(1, NodeKind::Integer(1));
        let two = ast.alloc(1, NodeKind::Integer(2));
        let sum = ast.alloc(
            1,
            NodeKind::BinaryOp {
                op: TokenKind::Plus,
                left: one,
                right: two,
            },
        );
        let neg = ast.alloc(1, NodeKind::UnaryOp { op: TokenKind::Minus, operand: sum });
        (ast, neg)
    }

    #[test]
    fn ids_are_assigned_in_preorder() {
        let (mut ast, root) = small_tree();
        let mut ids = IdVisitor::new();
        ids.assign(&mut ast, root);

        let order: Vec<usize> = preorder(&ast, root)
            .into_iter()
            .map(|n| ast.node(n).node_id)
            .collect();
        assert_eq!(order, vec![1, 2, 3, 4]);
        assert_eq!(ids.next_id(), 5);
    }

    #[test]
    fn leave_is_called_after_descendants() {
        struct Depth {
            current: usize,
            max: usize,
        }

        impl TypedVisitor for Depth {
            fn visit(&mut self, _ast: &Ast, _node: NodeRef) {
                self.current += 1;
                self.max = self.max.max(self.current);
            }

            fn leave(&mut self, _ast: &Ast, _node: NodeRef) {
                self.current -= 1;
            }
        }

        let (ast, root) = small_tree();
        let mut depth = Depth { current: 0, max: 0 };
        apply_typed_visitor(&mut depth, &ast, root);
        assert_eq!(depth.current, 0);
        assert_eq!(depth.max, 3);
    }

    #[test]
    fn deep_chain_is_walked_without_recursion() {
        let mut ast = Ast::new();
        let mut node = ast.alloc(1, NodeKind::Integer(0));
        for _ in 0..100_000 {
            node = ast.alloc(1, NodeKind::UnaryOp { op: TokenKind::Minus, operand: node });
        }

        let mut ids = IdVisitor::new();
        ids.assign(&mut ast, node);
        assert_eq!(ids.next_id(), 100_002);
        assert_eq!(ast.node(node).node_id, 1);
        assert_eq!(preorder(&ast, node).len(), 100_001);
    }

    #[test]
    fn write_tree_indents_each_level() {
        let mut ast = Ast::new();
        let mut node = ast.alloc(1, NodeKind::Integer(0));
        for _ in 0..2_000 {
            node = ast.alloc(1, NodeKind::UnaryOp { op: TokenKind::Not, operand: node });
        }

        let mut out = String::new();
        ast.write_tree(node, &mut out).unwrap();
        let lines: Vec<&str> = out.lines().collect();
        assert_eq!(lines.len(), 2_001);
        assert!(lines[0].starts_with("~ ["));
        assert!(lines[2_000].starts_with(&format!("{}0 ", " ".repeat(4_000))));
    }
}
