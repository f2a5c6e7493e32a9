//! Token bridge gateway bindings.
//!
//! Tokens move between chains through a router on each side that forwards
//! to the gateway registered for the token (standard, custom, WETH).

use alloy_sol_types::sol;

sol! {
    /// Gateway deployed on L2, emits one event per token withdrawal
    #[sol(rpc)]
    interface IL2ArbitrumGateway {
        /// Emitted when a token withdrawal is initiated on L2
        event WithdrawalInitiated(
            address l1Token,
            address indexed _from,
            address indexed _to,
            uint256 indexed _l2ToL1Id,
            uint256 _exitNum,
            uint256 _amount
        );
    }

    /// L2 router, entry point for token withdrawals
    #[sol(rpc)]
    interface IL2GatewayRouter {
        function outboundTransfer(
            address _l1Token,
            address _to,
            uint256 _amount,
            bytes calldata _data
        ) external payable returns (bytes memory);
    }

    /// L1 router, entry point for token deposits
    #[sol(rpc)]
    interface IL1GatewayRouter {
        function outboundTransfer(
            address _token,
            address _to,
            uint256 _amount,
            uint256 _maxGas,
            uint256 _gasPriceBid,
            bytes calldata _data
        ) external payable returns (bytes memory);

        /// Gateway that custodies the token (the approval spender)
        function getGateway(address _token) external view returns (address gateway);

        /// Counterpart address of an L1 token on L2
        function calculateL2TokenAddress(address l1ERC20) external view returns (address);
    }
}
