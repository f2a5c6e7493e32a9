//! ERC20 token contract bindings.

use alloy_sol_types::sol;

sol! {
    /// Subset of the ERC20 interface used by the bridge client
    #[sol(rpc)]
    interface IERC20 {
        function name() external view returns (string memory);

        function symbol() external view returns (string memory);

        function decimals() external view returns (uint8);

        /// Allowance granted by owner to spender
        function allowance(address owner, address spender) external view returns (uint256);

        /// Approve spender (the L1 gateway) to move tokens
        function approve(address spender, uint256 amount) external returns (bool);
    }
}
