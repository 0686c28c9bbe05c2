use std::collections::VecDeque;
use std::iter::Iterator;

use super::TreeNode;
use ids_forest::Float;

/// Level-order (BFT) iterator of nodes in a decision tree
pub struct NodeIter<'a, F> {
    nodes: &'a [TreeNode<F>],
    queue: VecDeque<usize>,
}

impl<'a, F> NodeIter<'a, F> {
    pub fn new(nodes: &'a [TreeNode<F>]) -> Self {
        let queue = if nodes.is_empty() {
            VecDeque::new()
        } else {
            VecDeque::from(vec![0])
        };

        NodeIter { nodes, queue }
    }
}

impl<'a, F: Float> Iterator for NodeIter<'a, F> {
    type Item = &'a TreeNode<F>;

    fn next(&mut self) -> Option<Self::Item> {
        self.queue.pop_front().map(|idx| {
            let node = &self.nodes[idx];
            if let Some((left, right)) = node.children() {
                self.queue.push_back(left);
                self.queue.push_back(right);
            }

            node
        })
    }
}
